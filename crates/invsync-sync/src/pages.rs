use std::time::Duration;

use invsync_core::{CandidateFilter, ItemRecord};

use crate::collaborators::ItemSource;
use crate::error::SyncError;

/// Lazy keyset pager over the candidate set.
///
/// Each call to [`CandidatePages::next_page`] fetches one page strictly after
/// the last `internal_id` seen. Iteration ends after the first short page.
pub struct CandidatePages<'a, S> {
    source: &'a S,
    filter: &'a CandidateFilter,
    page_size: u32,
    call_timeout: Duration,
    cursor: Option<i64>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: ItemSource> CandidatePages<'a, S> {
    pub fn new(
        source: &'a S,
        filter: &'a CandidateFilter,
        page_size: u32,
        call_timeout: Duration,
    ) -> Self {
        Self {
            source,
            filter,
            page_size: page_size.max(1),
            call_timeout,
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetches the next non-empty page, or `None` once the set is exhausted.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Query`] / [`SyncError::QueryTimeout`] if the source
    ///   fails or does not answer in time.
    /// - [`SyncError::PaginationStalled`] if the page does not move strictly
    ///   past the cursor, which would otherwise loop forever.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ItemRecord>>, SyncError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = tokio::time::timeout(
            self.call_timeout,
            self.source
                .fetch_page(self.filter, self.cursor, self.page_size),
        )
        .await
        .map_err(|_| SyncError::QueryTimeout(self.call_timeout))??;

        let full_page = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        if page.len() < full_page {
            self.exhausted = true;
        }
        if page.is_empty() {
            return Ok(None);
        }

        let mut last = self.cursor;
        for item in &page {
            if last.is_some_and(|prev| item.internal_id <= prev) {
                self.exhausted = true;
                return Err(SyncError::PaginationStalled { after: self.cursor });
            }
            last = Some(item.internal_id);
        }

        self.cursor = last;
        self.pages_fetched += 1;
        Ok(Some(page))
    }

    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
