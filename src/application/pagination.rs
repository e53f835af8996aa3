//! Offset pagination helpers.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 9;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A normalized, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageParams {
    pub page: u32,
    pub page_size: u32,
}

impl PageParams {
    /// Rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Bounds applied when turning raw request values into [`PageParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl From<&crate::config::PaginationSettings> for PageLimits {
    fn from(settings: &crate::config::PaginationSettings) -> Self {
        Self {
            default_size: settings.default_page_size.get(),
            max_size: settings.max_page_size.get(),
        }
    }
}

impl PageLimits {
    /// Normalize caller input; out-of-range values are corrected rather than rejected.
    ///
    /// `page < 1` becomes 1, `page_size < 1` becomes the default and sizes above
    /// the maximum are clamped to it.
    pub fn params(&self, page: Option<i64>, page_size: Option<i64>) -> PageParams {
        let page = match page {
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => 1,
        };

        let page_size = match page_size {
            Some(value) if value >= 1 => {
                u32::try_from(value).map_or(self.max_size, |size| size.min(self.max_size))
            }
            _ => self.default_size,
        };

        PageParams { page, page_size }
    }
}

/// One page of results plus the metadata needed to render pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: PageParams) -> Self {
        Self {
            items,
            total_count,
            total_pages: total_pages(total_count, page.page_size),
            current_page: page.page,
            page_size: page.page_size,
        }
    }

    pub fn empty(current_page: u32, page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 0,
            current_page,
            page_size,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.total_pages
    }
}

fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(page_size))
}
