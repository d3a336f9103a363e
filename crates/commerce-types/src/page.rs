use serde::{Deserialize, Serialize};

/// Page size applied when a request leaves it unset or non-positive.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// 1-based pagination request.
///
/// Raw values are accepted as-is from callers; [`PageRequest::normalized`]
/// clamps the page to at least 1 and replaces a non-positive page size with
/// [`DEFAULT_PAGE_SIZE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: if self.page_size < 1 {
                DEFAULT_PAGE_SIZE
            } else {
                self.page_size
            },
        }
    }

    /// Number of rows to skip, computed from the normalized request.
    pub fn offset(&self) -> usize {
        let n = self.normalized();
        ((n.page - 1).saturating_mul(n.page_size)).max(0) as usize
    }

    /// Maximum number of rows on the page.
    pub fn limit(&self) -> usize {
        self.normalized().page_size as usize
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of rows plus the total number of rows matching the filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let request = request.normalized();
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size <= 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
