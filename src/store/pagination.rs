use crate::utils::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};

/// 1-indexed page request for the read contract.
///
/// A page beyond the end of the result set yields an empty page, not an
/// error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self { page, page_size }
    }

    /// Page number, 1-indexed, defaulting to the first page.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Rows per page, defaulted and clamped.
    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// SQL OFFSET: `(page - 1) * page_size`.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.page_size()
    }

    /// SQL LIMIT.
    pub fn limit(&self) -> i64 {
        self.page_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let page = PageRequest::default();
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset_is_one_indexed() {
        let page = PageRequest::new(Some(2), Some(20));
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 20);

        let page = PageRequest::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_clamping() {
        let page = PageRequest::new(Some(0), Some(-5));
        assert_eq!(page.page(), 1);
        assert_eq!(page.page_size(), 1);

        let page = PageRequest::new(None, Some(MAX_PAGE_SIZE + 1));
        assert_eq!(page.page_size(), MAX_PAGE_SIZE);
    }
}
