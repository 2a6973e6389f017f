//! Paginated listing response wrapper

use serde::Serialize;
use utoipa::ToSchema;

/// Default number of items per listing page
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Hard cap on caller-supplied page sizes
pub const MAX_PAGE_SIZE: i64 = 100;

/// Paginated response carried by every listing endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items on the current page
    pub items: Vec<T>,
    /// Current page number (1-based)
    pub page: i64,
    /// Total number of pages for the query
    pub total_pages: i64,
}

impl<T> Page<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, page: i64, total: i64, per_page: i64) -> Self {
        Self {
            items,
            page,
            total_pages: total_pages(total, per_page),
        }
    }
}

/// Normalize caller paging input to `(page, per_page, offset)`.
/// Page numbers are 1-based; out-of-range values are clamped.
pub fn page_window(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_and_clamps() {
        assert_eq!(page_window(None, None), (1, DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_window(Some(0), Some(10)), (1, 10, 0));
        assert_eq!(page_window(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(page_window(Some(1), Some(1000)), (1, MAX_PAGE_SIZE, 0));
        assert_eq!(page_window(Some(-5), Some(-1)), (1, 1, 0));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
    }
}
