//! Limit/offset pagination as served by the backend list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page the backend will serve.
pub const MAX_LIMIT: u32 = 50;
/// Page sizes offered to the user.
pub const LIMIT_OPTIONS: [u32; 4] = [5, 10, 20, 50];

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub limit: u32,
    pub offset: u32,
    pub count: u32,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// The query that produced this page.
    pub fn query(&self) -> PageQuery {
        PageQuery::new(self.limit, self.offset)
    }

    pub fn total_pages(&self) -> u32 {
        self.query().total_pages(self.count)
    }

    pub fn current_page(&self) -> u32 {
        self.query().current_page()
    }
}

/// Requested window of a list: `limit` items starting at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    limit: u32,
    offset: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

impl PageQuery {
    /// A zero limit becomes 1; limits above [`MAX_LIMIT`] are capped.
    pub fn new(
        limit: u32,
        offset: u32,
    ) -> Self {
        Self {
            limit: clamp_limit(limit),
            offset,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn total_pages(
        &self,
        count: u32,
    ) -> u32 {
        count.div_ceil(self.limit)
    }

    /// 1-based page containing `offset`.
    pub fn current_page(&self) -> u32 {
        self.offset / self.limit + 1
    }

    /// Same page size, jumping to 1-based `page` (page 0 is treated as 1).
    pub fn for_page(
        &self,
        page: u32,
    ) -> Self {
        Self {
            limit: self.limit,
            offset: page.saturating_sub(1).saturating_mul(self.limit),
        }
    }

    /// New page size; goes back to the first page.
    pub fn with_limit(
        &self,
        limit: u32,
    ) -> Self {
        Self::new(limit, 0)
    }

    pub fn to_query(&self) -> String {
        format!("limit={}&offset={}", self.limit, self.offset)
    }

    /// Parses `limit=..&offset=..` (a leading `?` is allowed). Unknown keys
    /// are ignored; missing or malformed values fall back to the defaults.
    pub fn from_query(query: &str) -> Self {
        let mut page = Self::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "limit" => {
                    if let Ok(limit) = value.parse() {
                        page.limit = clamp_limit(limit);
                    }
                }
                "offset" => {
                    if let Ok(offset) = value.parse() {
                        page.offset = offset;
                    }
                }
                _ => {}
            }
        }
        page
    }
}
