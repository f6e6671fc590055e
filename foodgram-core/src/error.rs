use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Expected a base64 data URI (data:image/<type>;base64,...)")]
    NotDataUri,

    #[error("Invalid base64 payload")]
    InvalidBase64,

    #[error("Image too large. Maximum size is {max} bytes")]
    TooLarge { max: usize },

    #[error("Could not detect image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0}. Allowed: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    #[error("Invalid page.")]
    InvalidPage,
}
