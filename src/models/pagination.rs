//! Pagination primitives shared by the list endpoints.

use serde::{Deserialize, Serialize};

/// Pagination query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    const MAX_PER_PAGE: i64 = 200;
    const DEFAULT_PER_PAGE: i64 = 50;

    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.current_page() - 1) * self.limit()
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T: Serialize> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit();
        Self {
            items,
            total,
            page: pagination.current_page(),
            per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.limit(), 50);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn pagination_clamps_per_page_and_page() {
        let p = Pagination {
            page: Some(-4),
            per_page: Some(10_000),
        };
        assert_eq!(p.limit(), 200);
        assert_eq!(p.current_page(), 1);
    }

    #[test]
    fn paged_result_total_pages() {
        let p = Pagination {
            page: Some(2),
            per_page: Some(20),
        };
        assert_eq!(p.offset(), 20);
        let result = PagedResult::new(vec!["a"; 20], 41, &p);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.page, 2);
    }
}
