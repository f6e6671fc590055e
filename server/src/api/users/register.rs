use crate::api::{ApiError, ApiJson, ApiResult, ValidationErrorResponse};
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use foodgram_core::validation::{
    check_email, check_username, max_length, required_text, required_untrimmed,
    MAX_EMAIL_LENGTH, MAX_USER_NAME_LENGTH,
};
use foodgram_core::FieldErrors;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const EMAIL_TAKEN: &str = "A user with that email already exists.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Registration fields after validation.
#[derive(Debug, PartialEq, Eq)]
struct Registration<'a> {
    email: &'a str,
    username: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
}

fn validate(req: &RegisterRequest) -> Result<Registration<'_>, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = required_text(&mut errors, "email", req.email.as_deref()).filter(|email| {
        if !max_length(&mut errors, "email", email, MAX_EMAIL_LENGTH) {
            return false;
        }
        match check_email(email) {
            Ok(()) => true,
            Err(message) => {
                errors.add("email", message);
                false
            }
        }
    });

    let username = required_text(&mut errors, "username", req.username.as_deref()).filter(|name| {
        if !max_length(&mut errors, "username", name, MAX_USER_NAME_LENGTH) {
            return false;
        }
        match check_username(name) {
            Ok(()) => true,
            Err(message) => {
                errors.add("username", message);
                false
            }
        }
    });

    let first_name = required_text(&mut errors, "first_name", req.first_name.as_deref())
        .filter(|v| max_length(&mut errors, "first_name", v, MAX_USER_NAME_LENGTH));
    let last_name = required_text(&mut errors, "last_name", req.last_name.as_deref())
        .filter(|v| max_length(&mut errors, "last_name", v, MAX_USER_NAME_LENGTH));
    let password = required_untrimmed(&mut errors, "password", req.password.as_deref());

    match (email, username, first_name, last_name, password) {
        (Some(email), Some(username), Some(first_name), Some(last_name), Some(password))
            if errors.is_empty() =>
        {
            Ok(Registration {
                email,
                username,
                first_name,
                last_name,
                password,
            })
        }
        _ => Err(errors),
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body(content = RegisterRequest, example = json!({
        "email": "vpupkin@yandex.ru",
        "username": "vasya.pupkin",
        "first_name": "Вася",
        "last_name": "Иванов",
        "password": "Qwerty123"
    })),
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid or duplicate fields", body = ValidationErrorResponse)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let registration = validate(&req)?;

    let mut conn = pool.get()?;

    let mut errors = FieldErrors::new();
    let email_taken: bool = diesel::select(diesel::dsl::exists(users::table.filter(
        diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
            .bind::<diesel::sql_types::Text, _>(registration.email)
            .sql(")"),
    )))
    .get_result(&mut conn)?;
    if email_taken {
        errors.add("email", EMAIL_TAKEN);
    }
    let username_taken: bool = diesel::select(diesel::dsl::exists(
        users::table.filter(users::username.eq(registration.username)),
    ))
    .get_result(&mut conn)?;
    if username_taken {
        errors.add("username", USERNAME_TAKEN);
    }
    errors.into_result()?;

    let password_hash = hash_password(registration.password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to hash password: {}", e)))?;

    let user: User = diesel::insert_into(users::table)
        .values(NewUser {
            email: registration.email,
            username: registration.username,
            first_name: registration.first_name,
            last_name: registration.last_name,
            password_hash: &password_hash,
        })
        .returning(User::as_returning())
        .get_result(&mut conn)
        .map_err(|e| match e {
            // Lost a race with a concurrent registration
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                if info.constraint_name() == Some("idx_users_email") {
                    ApiError::field("email", EMAIL_TAKEN)
                } else {
                    ApiError::field("username", USERNAME_TAKEN)
                }
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}
