//! Page links for long listings.

use std::ops::Range;

/// One entry in a pagination list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationObject {
    /// Link text.
    pub text: String,
    /// Prefix used for request variables.
    pub prefix: String,
    /// Row offset the link points at.
    pub base: Option<usize>,
    /// Link target.
    pub link: Option<String>,
    /// Whether this is the page being shown.
    pub active: bool,
}

impl PaginationObject {
    pub fn new(text: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prefix: prefix.into(),
            base: None,
            link: None,
            active: false,
        }
    }

    /// Point the object at the page starting at row `base`.
    pub fn with_base(mut self, base: usize) -> Self {
        self.link = Some(format!("?{}limitstart={}", self.prefix, base));
        self.base = Some(base);
        self
    }

    /// Mark as the current page.
    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

/// Splits `total` rows into pages of `limit` rows starting at `start`.
///
/// A `limit` of zero shows everything on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub start: usize,
    pub prefix: String,
}

impl Pagination {
    /// Create a pagination; `start` is snapped down to a page boundary and
    /// clamped to the last page.
    pub fn new(total: usize, start: usize, limit: usize) -> Self {
        let mut pagination = Self {
            total,
            limit,
            start: 0,
            prefix: String::new(),
        };
        if limit > 0 && total > 0 {
            let last_page_start = (pagination.pages_total() - 1) * limit;
            pagination.start = (start / limit * limit).min(last_page_start);
        }
        pagination
    }

    /// Use a request-variable prefix (for several lists on one page).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Number of pages (at least one).
    pub fn pages_total(&self) -> usize {
        if self.limit == 0 || self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    /// 1-based index of the current page.
    pub fn current_page(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.start / self.limit + 1
        }
    }

    /// Rows shown on the current page.
    pub fn range(&self) -> Range<usize> {
        if self.limit == 0 {
            0..self.total
        } else {
            self.start..self.start.saturating_add(self.limit).min(self.total)
        }
    }

    /// One object per page; the current page is active and carries no link.
    pub fn pages(&self) -> Vec<PaginationObject> {
        let current = self.current_page();
        (1..=self.pages_total())
            .map(|page| {
                let object = PaginationObject::new(page.to_string(), self.prefix.as_str());
                if page == current {
                    object.activated()
                } else {
                    object.with_base((page - 1) * self.limit)
                }
            })
            .collect()
    }

    /// Link to the previous page, if any.
    pub fn previous(&self) -> Option<PaginationObject> {
        (self.current_page() > 1).then(|| {
            PaginationObject::new("Prev", self.prefix.as_str()).with_base(self.start - self.limit)
        })
    }

    /// Link to the next page, if any.
    pub fn next(&self) -> Option<PaginationObject> {
        (self.current_page() < self.pages_total()).then(|| {
            PaginationObject::new("Next", self.prefix.as_str()).with_base(self.start + self.limit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_defaults() {
        let object = PaginationObject::new("3", "");
        assert_eq!(object.text, "3");
        assert!(object.base.is_none());
        assert!(object.link.is_none());
        assert!(!object.active);
    }

    #[test]
    fn test_object_link_uses_prefix() {
        let object = PaginationObject::new("2", "sessions_").with_base(20);
        assert_eq!(object.base, Some(20));
        assert_eq!(object.link.as_deref(), Some("?sessions_limitstart=20"));
    }

    #[test]
    fn test_pages() {
        let pagination = Pagination::new(25, 10, 10);
        assert_eq!(pagination.pages_total(), 3);
        assert_eq!(pagination.current_page(), 2);
        assert_eq!(pagination.range(), 10..20);

        let pages = pagination.pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].base, Some(0));
        assert!(pages[1].active);
        assert!(pages[1].link.is_none());
        assert_eq!(pages[2].base, Some(20));
    }

    #[test]
    fn test_start_snapped_and_clamped() {
        assert_eq!(Pagination::new(25, 15, 10).start, 10);
        assert_eq!(Pagination::new(25, 99, 10).start, 20);
        assert_eq!(Pagination::new(25, 99, 10).range(), 20..25);
        assert_eq!(Pagination::new(0, 50, 10).start, 0);
    }

    #[test]
    fn test_unlimited() {
        let pagination = Pagination::new(42, 0, 0);
        assert_eq!(pagination.pages_total(), 1);
        assert_eq!(pagination.range(), 0..42);
        assert!(pagination.previous().is_none());
        assert!(pagination.next().is_none());
    }

    #[test]
    fn test_previous_next() {
        let first = Pagination::new(25, 0, 10);
        assert!(first.previous().is_none());
        assert_eq!(first.next().unwrap().base, Some(10));

        let last = Pagination::new(25, 20, 10);
        assert_eq!(last.previous().unwrap().base, Some(10));
        assert!(last.next().is_none());
    }
}
