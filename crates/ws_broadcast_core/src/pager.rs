use futures::stream::{self, Stream};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{ConnectionStore, Page};

/// Drains a table through repeated bounded scans.
///
/// The sequence is lazy, finite and not restartable. It ends when a page
/// carries no continuation token, or as soon as a page comes back with zero
/// records even if it still carries one. Empty pages are never yielded, and
/// nothing is yielded after an error.
pub struct ScanPager<'a, S: ConnectionStore> {
    store: &'a S,
    table: &'a str,
    limit: u32,
    cursor: Option<S::Cursor>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, S: ConnectionStore + 'a> ScanPager<'a, S> {
    pub fn new(store: &'a S, table: &'a str, limit: u32) -> Self {
        Self {
            store,
            table,
            limit: limit.max(1),
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub async fn next_page(&mut self) -> Result<Option<Page<S::Cursor>>, StoreError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = match self
            .store
            .scan(self.table, self.limit, self.cursor.take())
            .await
        {
            Ok(page) => page,
            Err(error) => {
                self.exhausted = true;
                return Err(error);
            }
        };
        self.pages_fetched += 1;

        debug!(
            component = "pager",
            table = self.table,
            page = self.pages_fetched,
            records = page.records.len(),
            has_continuation = page.continuation.is_some(),
            "scanned page"
        );

        if page.records.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        if page.is_last() {
            self.exhausted = true;
        } else {
            self.cursor = page.continuation.clone();
        }

        Ok(Some(page))
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Page<S::Cursor>, StoreError>> + 'a {
        stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok(page.map(|page| (page, pager)))
        })
    }
}
