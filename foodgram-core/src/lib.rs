pub mod error;
pub mod filters;
pub mod image;
pub mod pagination;
pub mod query;
pub mod shopping_list;
pub mod validation;

pub use error::{ImageError, PageError};
pub use filters::{RecipeFilter, RecipeOrdering};
pub use image::{decode_data_uri, validate_image, DecodedImage, MAX_FILE_SIZE};
pub use pagination::{PageLinks, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use query::QueryParams;
pub use shopping_list::{CartLine, ShoppingItem, ShoppingList};
pub use validation::FieldErrors;
