use crate::api::{ApiError, ApiJson, ApiResult, ValidationErrorResponse};
use crate::auth::{create_session, verify_password};
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, Json};
use diesel::prelude::*;
use foodgram_core::validation::{required_text, required_untrimmed};
use foodgram_core::FieldErrors;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/token/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "vpupkin@yandex.ru", "password": "Qwerty123"})),
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing fields or wrong credentials", body = ValidationErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let mut errors = FieldErrors::new();
    let email = required_text(&mut errors, "email", req.email.as_deref());
    let password = required_untrimmed(&mut errors, "password", req.password.as_deref());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(errors.into());
    };

    let mut conn = pool.get()?;

    let user: Option<User> = users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(email)
                .sql(")"),
        )
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    let user = match user {
        Some(user) if verify_password(password, &user.password_hash) => user,
        _ => {
            tracing::info!("Rejected login attempt");
            return Err(ApiError::field("non_field_errors", INVALID_CREDENTIALS));
        }
    };

    let auth_token = create_session(&mut conn, user.id)?;
    tracing::info!(user_id = user.id, "Issued auth token");

    Ok(Json(LoginResponse { auth_token }))
}
