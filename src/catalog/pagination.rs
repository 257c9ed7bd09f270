/// Page arithmetic for the book listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl Pagination {
    /// Clamps `requested` into `1..=last_page`.
    pub fn new(requested: u32, page_size: u32, total: u64) -> Self {
        let page_size = page_size.max(1);
        let last = last_page(total, page_size);
        Self {
            page: requested.clamp(1, last),
            page_size,
            total,
        }
    }

    /// `ceil(total / page_size)`; zero when there is nothing to list.
    pub fn page_count(&self) -> u32 {
        page_count(self.total, self.page_size)
    }

    pub fn last_page(&self) -> u32 {
        last_page(self.total, self.page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn previous(&self) -> u32 {
        self.page.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> u32 {
        (self.page + 1).min(self.last_page())
    }

    /// Controls are pointless for a single page.
    pub fn shows_controls(&self) -> bool {
        self.page_count() > 1
    }
}

pub fn page_count(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
}

/// Page 1 always exists, even for an empty listing.
pub fn last_page(total: u64, page_size: u32) -> u32 {
    page_count(total, page_size).max(1)
}

/// Lenient page parsing for query strings: anything unusable means page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|&p| p >= 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_books_make_two_pages() {
        let p = Pagination::new(2, 6, 7);
        assert_eq!(p.page_count(), 2);
        assert_eq!(p.page, 2);
        assert_eq!(p.offset(), 6);
        assert!(!p.has_next());
        assert!(p.has_previous());
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        assert_eq!(page_count(12, 6), 2);
        assert_eq!(page_count(13, 6), 3);
        assert_eq!(page_count(1, 6), 1);
    }

    #[test]
    fn empty_listing_still_has_page_one() {
        let p = Pagination::new(5, 6, 0);
        assert_eq!(p.page_count(), 0);
        assert_eq!(p.last_page(), 1);
        assert_eq!(p.page, 1);
        assert_eq!(p.offset(), 0);
        assert!(!p.shows_controls());
    }

    #[test]
    fn beyond_last_page_clamps() {
        let p = Pagination::new(99, 6, 7);
        assert_eq!(p.page, 2);
        assert_eq!(p.next(), 2);
    }

    #[test]
    fn page_zero_clamps_to_first() {
        let p = Pagination::new(0, 6, 20);
        assert_eq!(p.page, 1);
        assert_eq!(p.previous(), 1);
        assert!(!p.has_previous());
        assert_eq!(p.next(), 2);
    }

    #[test]
    fn parse_page_is_lenient() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("-3")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some(" 4 ")), 4);
    }
}
