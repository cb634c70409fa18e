//! Lazy sequences over paginated listings
//!
//! A [`Paginator`] wraps a page-fetching function `(token, page_size) ->
//! batch` and yields the items of successive batches as one sequence. It
//! stops as soon as a batch comes back shorter than the requested page
//! size; there is no total-count check, so a final page that is exactly
//! full costs one extra, empty round trip.
//!
//! ## Addressing Modes
//!
//! - [`PageMode::Paged`]: the token is a page number, starting at `origin`
//!   and incremented by one per call
//! - [`PageMode::Offset`]: the token is an item offset, starting at 0 and
//!   incremented by the page size per call
//!
//! ## Usage
//!
//! ```rust
//! use zonekit_core::pagination::Paginator;
//!
//! let items: Vec<u32> = (0..25).collect();
//! let pages = Paginator::offset(
//!     |offset: u64, limit: usize| {
//!         let start = (offset as usize).min(items.len());
//!         let end = (start + limit).min(items.len());
//!         Ok::<_, zonekit_core::Error>(items[start..end].to_vec())
//!     },
//!     10,
//! );
//!
//! let all: Vec<u32> = pages.iter().collect::<Result<_, _>>().unwrap();
//! assert_eq!(all, items);
//! ```

use crate::error::Result;

/// First page number used for page-indexed listings
pub const DEFAULT_PAGE_ORIGIN: u64 = 1;

/// Page size used when none is configured
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// How the fetch token advances between calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Token is a page number starting at `origin`
    Paged { origin: u64 },
    /// Token is a cumulative item offset starting at 0
    Offset,
}

impl PageMode {
    fn first_token(self) -> u64 {
        match self {
            PageMode::Paged { origin } => origin,
            PageMode::Offset => 0,
        }
    }

    fn advance(self, token: u64, page_size: usize) -> u64 {
        match self {
            PageMode::Paged { .. } => token + 1,
            PageMode::Offset => token + page_size as u64,
        }
    }
}

/// A restartable, lazily fetched sequence over a paginated listing
///
/// Nothing is cached: every call to [`Paginator::iter`] starts again from
/// the first page.
pub struct Paginator<F> {
    fetch: F,
    page_size: usize,
    mode: PageMode,
}

impl<F> Paginator<F> {
    /// Page-indexed listing starting at [`DEFAULT_PAGE_ORIGIN`]
    pub fn paged(fetch: F, page_size: usize) -> Self {
        Self::new(fetch, page_size, PageMode::Paged {
            origin: DEFAULT_PAGE_ORIGIN,
        })
    }

    /// Page-indexed listing starting at `origin`
    pub fn paged_from(origin: u64, fetch: F, page_size: usize) -> Self {
        Self::new(fetch, page_size, PageMode::Paged { origin })
    }

    /// Offset-indexed listing
    pub fn offset(fetch: F, page_size: usize) -> Self {
        Self::new(fetch, page_size, PageMode::Offset)
    }

    /// Create a paginator; a page size of 0 is treated as 1
    pub fn new(fetch: F, page_size: usize, mode: PageMode) -> Self {
        Self {
            fetch,
            page_size: page_size.max(1),
            mode,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Iterate from the first page
    pub fn iter<T>(&self) -> Pages<'_, F, T>
    where
        F: Fn(u64, usize) -> Result<Vec<T>>,
    {
        Pages {
            fetch: &self.fetch,
            cursor: Cursor::new(self.mode, self.page_size),
        }
    }
}

impl<F> std::fmt::Debug for Paginator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("page_size", &self.page_size)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Position within a paginated listing
struct Cursor<T> {
    mode: PageMode,
    page_size: usize,
    token: u64,
    batch: std::vec::IntoIter<T>,
    exhausted: bool,
}

impl<T> Cursor<T> {
    fn new(mode: PageMode, page_size: usize) -> Self {
        Self {
            mode,
            page_size,
            token: mode.first_token(),
            batch: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    fn next_with<F>(&mut self, fetch: &F) -> Option<Result<T>>
    where
        F: Fn(u64, usize) -> Result<Vec<T>>,
    {
        loop {
            if let Some(item) = self.batch.next() {
                return Some(Ok(item));
            }
            if self.exhausted {
                return None;
            }

            let token = self.token;
            match fetch(token, self.page_size) {
                Ok(batch) => {
                    tracing::trace!(token, size = batch.len(), "Fetched page");
                    // A short batch is the only end-of-listing signal
                    if batch.len() < self.page_size {
                        self.exhausted = true;
                    }
                    self.token = self.mode.advance(token, self.page_size);
                    self.batch = batch.into_iter();
                }
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Borrowing iterator returned by [`Paginator::iter`]
pub struct Pages<'a, F, T> {
    fetch: &'a F,
    cursor: Cursor<T>,
}

impl<F, T> Iterator for Pages<'_, F, T>
where
    F: Fn(u64, usize) -> Result<Vec<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_with(self.fetch)
    }
}

/// Owning iterator over a consumed [`Paginator`]
pub struct IntoPages<F, T> {
    fetch: F,
    cursor: Cursor<T>,
}

impl<F, T> Iterator for IntoPages<F, T>
where
    F: Fn(u64, usize) -> Result<Vec<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_with(&self.fetch)
    }
}

impl<F, T> IntoIterator for Paginator<F>
where
    F: Fn(u64, usize) -> Result<Vec<T>>,
{
    type Item = Result<T>;
    type IntoIter = IntoPages<F, T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoPages {
            cursor: Cursor::new(self.mode, self.page_size),
            fetch: self.fetch,
        }
    }
}

impl<'a, F, T> IntoIterator for &'a Paginator<F>
where
    F: Fn(u64, usize) -> Result<Vec<T>>,
{
    type Item = Result<T>;
    type IntoIter = Pages<'a, F, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
