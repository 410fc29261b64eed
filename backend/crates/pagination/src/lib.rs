//! Page request and page envelope primitives for catalogue listings.
//!
//! Listings are addressed by a one-based page number and a page size. The
//! upstream catalogue speaks in `skip`/`limit` offsets, so [`PageRequest`]
//! owns the translation between the two and [`Page`] carries the returned
//! slice together with the total match count needed to decide whether another
//! page exists.
//!
//! # Example
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(3, 20).expect("valid request");
//! assert_eq!(request.offset(), 40);
//!
//! let page = Page::new(vec!["a", "b"], 42, request.offset(), request.limit());
//! assert_eq!(page.total_pages(), 3);
//! assert_eq!(page.next_page(3), None);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when callers do not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page number must be at least 1")]
    ZeroPage,
    /// A page must hold at least one item.
    #[error("page size must be at least 1")]
    ZeroLimit,
}

/// One-based page address with a positive page size.
///
/// ## Invariants
/// - `page >= 1`
/// - `limit >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PageRequestDto", into = "PageRequestDto")]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when either value is zero.
    pub const fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self { page, limit })
    }

    /// First page with the given size, substituting the default for zero.
    #[must_use]
    pub const fn first(limit: u32) -> Self {
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        Self { page: 1, limit }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items preceding this page, i.e. `(page - 1) * limit`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// The page following this one, saturating at `u32::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PageRequestDto {
    page: u32,
    limit: u32,
}

impl From<PageRequest> for PageRequestDto {
    fn from(value: PageRequest) -> Self {
        Self {
            page: value.page,
            limit: value.limit,
        }
    }
}

impl TryFrom<PageRequestDto> for PageRequest {
    type Error = PageRequestError;

    fn try_from(value: PageRequestDto) -> Result<Self, Self::Error> {
        Self::new(value.page, value.limit)
    }
}

/// A slice of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in upstream order.
    pub items: Vec<T>,
    /// Total number of matches across all pages.
    pub total: u64,
    /// Number of matches skipped before this page.
    pub skip: u64,
    /// Requested page size.
    pub limit: u32,
}

impl<T> Page<T> {
    /// Build a page envelope.
    pub const fn new(items: Vec<T>, total: u64, skip: u64, limit: u32) -> Self {
        Self {
            items,
            total,
            skip,
            limit,
        }
    }

    /// An empty page for the given request.
    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request.offset(), request.limit())
    }

    /// Number of pages needed to cover `total` at this page size.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        total_pages(self.total, self.limit)
    }

    /// Page number to fetch after `pages_loaded` pages, if any remain.
    #[must_use]
    pub fn next_page(&self, pages_loaded: u32) -> Option<u32> {
        next_page_after(self.total, self.limit, pages_loaded)
    }

    /// Map the items while keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Number of pages of size `limit` needed to hold `total` items.
///
/// A zero `limit` is treated as [`DEFAULT_PAGE_SIZE`].
#[must_use]
pub const fn total_pages(total: u64, limit: u32) -> u64 {
    let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
    total.div_ceil(limit as u64)
}

/// Page number following `pages_loaded`, or `None` once every page is loaded.
#[must_use]
pub fn next_page_after(total: u64, limit: u32, pages_loaded: u32) -> Option<u32> {
    if u64::from(pages_loaded) < total_pages(total, limit) {
        pages_loaded.checked_add(1)
    } else {
        None
    }
}
