//! Page-number pagination shared by the listing endpoints.

use serde::Serialize;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Page size used when the client sends none.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest offset the database accepts (a signed 64-bit `OFFSET`).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u64,
    /// Items per page.
    pub page_size: u64,
}

impl PageRequest {
    /// Normalize a page request: `page < 1` becomes 1 and the size is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build from optional query parameters.
    #[must_use]
    pub fn from_query(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self::new(page.unwrap_or(1), page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Rows to skip: `(page - 1) * page_size`, saturating at the largest
    /// offset the database accepts. Such a page is simply empty.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.page_size);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }

    /// Rows to take.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page number.
    pub page: u64,
    /// Page size.
    pub page_size: u64,
    /// Total matching rows.
    pub total: u64,
}

impl<T> Paged<T> {
    /// Wrap items for a page request.
    #[must_use]
    pub const fn new(items: Vec<T>, page: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        }
    }

    /// Convert every item, keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }

    /// Number of pages given the total.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_one_based() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let page = PageRequest::from_query(Some(u64::MAX), Some(100));
        assert_eq!(page.offset(), i64::MAX as u64);
        assert_eq!(page.limit(), 100);

        let page = PageRequest::new(u64::MAX / 2, 2);
        assert!(page.offset() <= i64::MAX as u64);
    }

    #[test]
    fn test_normalization() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 1);

        let page = PageRequest::new(2, 10_000);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_from_query_defaults() {
        let page = PageRequest::from_query(None, None);
        assert_eq!(page, PageRequest::new(1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn test_map_and_total_pages() {
        let paged = Paged::new(vec![1, 2, 3], PageRequest::new(1, 3), 7);
        let mapped = paged.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.total_pages(), 3);
    }
}
