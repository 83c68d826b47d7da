//! Page/limit pagination shared by list endpoints.

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// 1-based page number (defaults to 1).
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    /// Page size clamped to `1..=100` (defaults to 10).
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.map_or(DEFAULT_LIMIT, |l| l.clamp(1, MAX_LIMIT))
    }

    /// Row offset for SQL `OFFSET`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        let pages = if total <= 0 {
            0
        } else {
            (total + i64::from(limit) - 1) / i64::from(limit)
        };
        Self {
            page: query.page(),
            limit,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_clamps_limit_and_page() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 100);
    }

    #[test]
    fn test_offset() {
        let query = PageQuery {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let query = PageQuery {
            page: Some(1),
            limit: Some(10),
        };
        assert_eq!(Pagination::new(&query, 0).pages, 0);
        assert_eq!(Pagination::new(&query, 10).pages, 1);
        assert_eq!(Pagination::new(&query, 11).pages, 2);
    }
}
