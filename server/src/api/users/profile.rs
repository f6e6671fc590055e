use crate::api::media::image_url;
use crate::models::User;
use crate::schema::follows;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

/// Public view of a user as seen by the current viewer
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the viewer follows this user. Always false for anonymous viewers.
    pub is_subscribed: bool,
    /// Absolute avatar URL
    pub avatar: Option<String>,
}

impl UserResponse {
    fn new(user: User, is_subscribed: bool, base_url: &str) -> Self {
        UserResponse {
            avatar: user.avatar_id.map(|id| image_url(base_url, id)),
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Ids among `author_ids` that `viewer` follows.
pub fn followed_ids(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> QueryResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = follows::table
        .filter(follows::user_id.eq(viewer))
        .filter(follows::author_id.eq_any(author_ids))
        .select(follows::author_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Shape users for `viewer`, keeping their order.
pub fn load_profiles(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    users: Vec<User>,
    base_url: &str,
) -> QueryResult<Vec<UserResponse>> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_ids(conn, viewer, &ids)?;

    Ok(users
        .into_iter()
        .map(|user| {
            let is_subscribed = followed.contains(&user.id);
            UserResponse::new(user, is_subscribed, base_url)
        })
        .collect())
}

pub fn load_profile(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    user: User,
    base_url: &str,
) -> QueryResult<UserResponse> {
    let mut profiles = load_profiles(conn, viewer, vec![user], base_url)?;
    profiles.pop().ok_or(diesel::result::Error::NotFound)
}
