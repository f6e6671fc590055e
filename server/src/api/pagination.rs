use diesel::prelude::*;
use foodgram_core::{PageLinks, PageRequest};
use serde::Serialize;
use utoipa::ToSchema;

use super::error::ApiResult;
use super::extract::ListQuery;

/// Paginated list envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    /// Total number of matching rows
    pub count: i64,
    /// Absolute URL of the next page
    pub next: Option<String>,
    /// Absolute URL of the previous page
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(
        results: Vec<T>,
        count: i64,
        request: PageRequest,
        base_url: &str,
        query: &ListQuery,
    ) -> Self {
        let links = PageLinks::build(base_url, &query.path, &query.params, request, count);
        Page {
            count,
            next: links.next,
            previous: links.previous,
            results,
        }
    }
}

/// Read `page`/`limit` and run `count`, rejecting pages past the end.
///
/// Returns the validated request and the total so the caller can load the page.
pub fn paginate<F>(
    query: &ListQuery,
    conn: &mut PgConnection,
    count: F,
) -> ApiResult<(PageRequest, i64)>
where
    F: FnOnce(&mut PgConnection) -> QueryResult<i64>,
{
    let request = PageRequest::from_params(&query.params)?;
    let total = count(conn)?;
    request.check(total)?;
    Ok((request, total))
}
