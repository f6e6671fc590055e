use crate::api::pagination::paginate;
use crate::api::users::profile::{load_profiles, UserResponse};
use crate::api::{ApiResult, ErrorResponse, ListQuery, Page};
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (default 6, max 1000)")
    ),
    responses(
        (status = 200, description = "Users ordered by username", body = Page<UserResponse>),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_users(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    query: ListQuery,
) -> ApiResult<Json<Page<UserResponse>>> {
    let mut conn = pool.get()?;

    let (page, count) = paginate(&query, &mut conn, |conn| {
        users::table.count().get_result(conn)
    })?;

    let rows: Vec<User> = users::table
        .order((users::username.asc(), users::id.asc()))
        .select(User::as_select())
        .limit(page.limit)
        .offset(page.offset())
        .load(&mut conn)?;

    let results = load_profiles(&mut conn, viewer.id(), rows, &config.public_url)?;

    Ok(Json(Page::new(results, count, page, &config.public_url, &query)))
}
