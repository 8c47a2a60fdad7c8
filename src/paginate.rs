// Offset-based page collection. Each page request goes through the source,
// which is expected to wrap its HTTP call in `retry::call`.

use crate::error::{LugachError, Result};

/// One slice of a paginated result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            has_more: false,
        }
    }

    pub fn more(records: Vec<T>) -> Self {
        Self {
            records,
            has_more: true,
        }
    }
}

/// Something that can hand out a page given an offset and a page size.
pub trait PageSource {
    type Record;

    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Page<Self::Record>>;
}

impl<T, F> PageSource for F
where
    F: FnMut(usize, usize) -> Result<Page<T>>,
{
    type Record = T;

    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Page<T>> {
        self(offset, limit)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Collector {
    page_size: usize,
    max_pages: Option<usize>,
}

impl Collector {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            max_pages: None,
        }
    }

    /// Fail instead of fetching more than `max_pages` pages.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch every page from `source`, starting at offset 0, and concatenate
    /// the records in server order. Only `has_more` decides whether another
    /// page is requested.
    pub fn collect_all<S: PageSource>(&self, source: &mut S) -> Result<Vec<S::Record>> {
        // Offsets would never advance.
        if self.page_size == 0 {
            return Err(LugachError::config("page size must be positive"));
        }

        let mut records = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            if let Some(max_pages) = self.max_pages {
                if pages >= max_pages {
                    return Err(LugachError::PageLimitExceeded { max_pages });
                }
            }

            let page = source.fetch_page(offset, self.page_size)?;
            pages += 1;
            tracing::debug!(offset, count = page.records.len(), has_more = page.has_more, "fetched page");

            // An empty page can still say there is more; trust `has_more`
            // rather than the record count.
            if !page.records.is_empty() {
                records.extend(page.records);
            }
            if !page.has_more {
                break;
            }
            offset += self.page_size;
        }

        Ok(records)
    }
}

/// Shorthand for `Collector::new(page_size).collect_all(source)`.
pub fn collect_all<S: PageSource>(source: &mut S, page_size: usize) -> Result<Vec<S::Record>> {
    Collector::new(page_size).collect_all(source)
}
