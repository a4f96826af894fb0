use serde::Serialize;

/// Number of posts per listing page.
pub const PAGE_SIZE: u64 = 10;

/// Number of items preceding 1-based `page`. Saturates instead of
/// overflowing for absurd page numbers.
pub fn page_offset(page: u64, per_page: u64) -> u64 {
    page.max(1).saturating_sub(1).saturating_mul(per_page)
}

/// One page of a paginated result. Pages are 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            items,
            page,
            per_page,
            total,
        }
    }

    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(u64::MAX, 10), u64::MAX);
    }

    #[test]
    fn test_navigation() {
        let page = Page::new(vec![1, 2], 2, 10, 25);
        assert_eq!(page.last_page(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn test_empty_result_has_single_page() {
        let page: Page<u8> = Page::new(vec![], 1, 10, 0);
        assert_eq!(page.last_page(), 1);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }
}
