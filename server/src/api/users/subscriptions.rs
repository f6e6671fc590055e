use crate::api::pagination::paginate;
use crate::api::recipes::detail::RecipeMinified;
use crate::api::users::profile::{load_profiles, UserResponse};
use crate::api::{
    ApiError, ApiResult, ErrorResponse, ListQuery, ObjectId, Page, RuleErrorResponse,
};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::{NewFollow, Recipe, User};
use crate::raw_sql;
use crate::schema::{follows, recipes, users};
use axum::{extract::State, http::StatusCode, Json};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Array, BigInt, Int4, Nullable};
use foodgram_core::filters::recipes_limit;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

const SELF_SUBSCRIBE: &str = "Нельзя подписаться на самого себя.";
const ALREADY_SUBSCRIBED: &str = "Вы уже подписаны на этого автора.";
const NOT_SUBSCRIBED: &str = "Вы не были подписаны на этого автора.";

/// A followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Newest first, truncated to `recipes_limit`
    pub recipes: Vec<RecipeMinified>,
    /// Total number of recipes by this author
    pub recipes_count: i64,
}

/// Attach recipe previews to authors, keeping their order.
fn load_subscriptions(
    conn: &mut PgConnection,
    viewer: i32,
    authors: Vec<User>,
    limit: Option<usize>,
    base_url: &str,
) -> QueryResult<Vec<SubscriptionResponse>> {
    let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();

    let counts: HashMap<i32, i64> = recipes::table
        .filter(recipes::author_id.eq_any(&ids))
        .group_by(recipes::author_id)
        .select((recipes::author_id, count_star()))
        .load::<(i32, i64)>(conn)?
        .into_iter()
        .collect();

    let limit = limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
    let mut previews: HashMap<i32, Vec<RecipeMinified>> = HashMap::new();
    for recipe in sql_query(raw_sql::RECENT_RECIPES_BY_AUTHOR)
        .bind::<Array<Int4>, _>(ids)
        .bind::<Nullable<BigInt>, _>(limit)
        .load::<Recipe>(conn)?
    {
        previews
            .entry(recipe.author_id)
            .or_default()
            .push(RecipeMinified::new(&recipe, base_url));
    }

    let profiles = load_profiles(conn, Some(viewer), authors, base_url)?;

    Ok(profiles
        .into_iter()
        .map(|user| SubscriptionResponse {
            recipes_count: counts.get(&user.id).copied().unwrap_or(0),
            recipes: previews.remove(&user.id).unwrap_or_default(),
            user,
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (default 6, max 1000)"),
        ("recipes_limit" = Option<usize>, Query, description = "Max recipes per author")
    ),
    responses(
        (status = 200, description = "Followed authors", body = Page<SubscriptionResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    query: ListQuery,
) -> ApiResult<Json<Page<SubscriptionResponse>>> {
    let mut conn = pool.get()?;

    let (page, count) = paginate(&query, &mut conn, |conn| {
        follows::table
            .filter(follows::user_id.eq(user.id))
            .count()
            .get_result(conn)
    })?;

    let authors: Vec<User> = users::table
        .inner_join(follows::table.on(follows::author_id.eq(users::id)))
        .filter(follows::user_id.eq(user.id))
        .order((users::username.asc(), users::id.asc()))
        .select(User::as_select())
        .limit(page.limit)
        .offset(page.offset())
        .load(&mut conn)?;

    let results = load_subscriptions(
        &mut conn,
        user.id,
        authors,
        recipes_limit(&query.params),
        &config.public_url,
    )?;

    Ok(Json(Page::new(results, count, page, &config.public_url, &query)))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID"),
        ("recipes_limit" = Option<usize>, Query, description = "Max recipes in the response")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self or already subscribed", body = RuleErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(author_id): ObjectId,
    query: ListQuery,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let mut conn = pool.get()?;

    let author: User = users::table
        .find(author_id)
        .select(User::as_select())
        .first(&mut conn)?;

    if author.id == user.id {
        return Err(ApiError::bad_request(SELF_SUBSCRIBE));
    }

    let inserted = diesel::insert_into(follows::table)
        .values(NewFollow {
            user_id: user.id,
            author_id: author.id,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;
    if inserted == 0 {
        return Err(ApiError::bad_request(ALREADY_SUBSCRIBED));
    }

    tracing::info!(user_id = user.id, author_id = author.id, "Subscribed");

    let mut loaded = load_subscriptions(
        &mut conn,
        user.id,
        vec![author],
        recipes_limit(&query.params),
        &config.public_url,
    )?;
    let response = loaded.pop().ok_or(ApiError::NotFound)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Self or not subscribed", body = RuleErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    ObjectId(author_id): ObjectId,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;

    let author_id: i32 = users::table
        .find(author_id)
        .select(users::id)
        .first(&mut conn)?;

    if author_id == user.id {
        return Err(ApiError::bad_request(SELF_SUBSCRIBE));
    }

    let deleted = diesel::delete(
        follows::table
            .filter(follows::user_id.eq(user.id))
            .filter(follows::author_id.eq(author_id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::bad_request(NOT_SUBSCRIBED));
    }

    tracing::info!(user_id = user.id, author_id, "Unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}
