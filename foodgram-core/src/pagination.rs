//! Page-number pagination for list endpoints.
//!
//! Clients ask for `?page=N&limit=M`. Responses carry absolute `next` and
//! `previous` links that keep the rest of the query string intact.

use url::form_urlencoded;

use crate::error::PageError;
use crate::query::QueryParams;

/// Page size used when `limit` is absent or invalid.
pub const DEFAULT_PAGE_SIZE: i64 = 6;

/// Upper bound on `limit`.
pub const MAX_PAGE_SIZE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Read `page` and `limit` from the query string.
    ///
    /// A `page` that is not a positive integer is an error; a bad `limit`
    /// silently falls back to the default page size.
    pub fn from_params(params: &QueryParams) -> Result<Self, PageError> {
        let page = match params.get("page") {
            None => 1,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(PageError::InvalidPage),
            },
        };

        let limit = params
            .get("limit")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages for `count` rows. An empty result still has one page.
    pub fn page_count(&self, count: i64) -> i64 {
        if count <= 0 {
            1
        } else {
            (count + self.limit - 1) / self.limit
        }
    }

    /// Reject pages past the end of the result set.
    pub fn check(&self, count: i64) -> Result<(), PageError> {
        if self.page > self.page_count(count) {
            Err(PageError::InvalidPage)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl PageLinks {
    /// Build links for `request` given the total row count.
    ///
    /// `base_url` is the public origin (no trailing slash) and `path` the
    /// request path. The link to page 1 omits `page` entirely.
    pub fn build(
        base_url: &str,
        path: &str,
        params: &QueryParams,
        request: PageRequest,
        count: i64,
    ) -> Self {
        let next = (request.page < request.page_count(count))
            .then(|| link(base_url, path, params, Some(request.page + 1)));

        let previous = (request.page > 1).then(|| {
            let target = request.page - 1;
            link(base_url, path, params, (target > 1).then_some(target))
        });

        Self { next, previous }
    }
}

fn link(base_url: &str, path: &str, params: &QueryParams, page: Option<i64>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut page_written = false;

    for (key, value) in params.pairs() {
        if key == "page" {
            if !page_written {
                if let Some(page) = page {
                    serializer.append_pair("page", &page.to_string());
                }
                page_written = true;
            }
        } else {
            serializer.append_pair(key, value);
        }
    }

    if !page_written {
        if let Some(page) = page {
            serializer.append_pair("page", &page.to_string());
        }
    }

    let query = serializer.finish();
    if query.is_empty() {
        format!("{}{}", base_url, path)
    } else {
        format!("{}{}?{}", base_url, path, query)
    }
}
