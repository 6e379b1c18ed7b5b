//! Client-side pagination over fetched records.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Default rows per page for tables that do not set their own.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page position reported to the table widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based, always within `[1, total_pages]`.
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// A slice of items together with its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub info: PageInfo,
}

/// Pagination state for one table. Recomputed from the items on every
/// render, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: NonZeroUsize,
    current_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl Paginator {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            page_size,
            current_page: 1,
        }
    }

    /// Page size from an untrusted request value; `0` falls back to the
    /// default.
    pub fn with_size(page_size: usize) -> Self {
        NonZeroUsize::new(page_size).map(Self::new).unwrap_or_default()
    }

    /// Requests a page. The value is clamped when a page is taken.
    pub fn at_page(mut self, page: usize) -> Self {
        self.current_page = page;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Number of pages for `len` items. An empty collection still has one
    /// (empty) page.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size.get()).max(1)
    }

    /// Clamps the requested page into `[1, total_pages]` for `len` items.
    pub fn clamped_page(&self, len: usize) -> usize {
        self.current_page.clamp(1, self.total_pages(len))
    }

    /// Returns the `[(p-1)*size, p*size)` slice of `items` for the clamped
    /// page `p`.
    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        let size = self.page_size.get();
        let current_page = self.clamped_page(items.len());
        let start = ((current_page - 1) * size).min(items.len());
        let end = (current_page * size).min(items.len());
        Page {
            items: &items[start..end],
            info: PageInfo {
                current_page,
                page_size: size,
                total_pages: self.total_pages(items.len()),
                total_items: items.len(),
            },
        }
    }
}
