pub mod auth;
pub mod error;
pub mod extract;
pub mod ingredients;
pub mod media;
pub mod pagination;
pub mod recipes;
pub mod tags;
pub mod users;

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ListQuery, ObjectId};
pub use pagination::Page;

/// Error body for auth, permission, lookup and malformed-request failures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Error body for rule violations such as a duplicate favorite
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RuleErrorResponse {
    pub errors: String,
}

/// Per-field validation messages
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({"email": ["Enter a valid email address."]}))]
pub struct ValidationErrorResponse(pub BTreeMap<String, Vec<String>>);

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram", description = "Recipe sharing API"),
        components(schemas(ErrorResponse, RuleErrorResponse, ValidationErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        media::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
