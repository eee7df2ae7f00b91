use crate::feed::client::{ChangePage, ChangeSource, FetchError, Result};
use crate::feed::cursor::Cursor;
use crate::feed::record::ChangeRecord;

/// Largest page the API hands out to unprivileged clients.
pub const MAX_PAGE_SIZE: usize = 500;

/// Changes newer than the previous cursor, oldest first, and the cursor to
/// resume from next time.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedChanges {
    pub changes: Vec<ChangeRecord>,
    pub cursor: Cursor,
}

/// Turns a newest-first page into the changes past `cursor`, oldest first.
///
/// The new cursor is always the newest entry of the raw page, decoded or not,
/// so that a page made entirely of already-seen changes still moves the
/// cursor forward. An empty page leaves the cursor where it was.
pub fn select_new(page: ChangePage, cursor: &Cursor) -> FetchedChanges {
    let Some(newest) = page.newest else {
        return FetchedChanges {
            changes: Vec::new(),
            cursor: cursor.clone(),
        };
    };

    let mut changes: Vec<ChangeRecord> = page
        .changes
        .into_iter()
        .take_while(|change| cursor.is_before(change.id))
        .collect();
    changes.reverse();

    FetchedChanges {
        changes,
        cursor: newest,
    }
}

/// Cursor-driven reader over a [`ChangeSource`]
#[derive(Debug)]
pub struct FeedFetcher<S> {
    source: S,
    page_size: usize,
}

impl<S: ChangeSource> FeedFetcher<S> {
    pub fn new(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch the changes after `cursor`.
    ///
    /// Without a cursor this only locates the newest change: nothing is
    /// returned and the result's cursor marks where polling should start.
    pub async fn fetch(&self, cursor: Option<&Cursor>) -> Result<FetchedChanges> {
        let shown = cursor.map_or_else(|| "none".to_string(), ToString::to_string);
        tracing::info!(cursor = %shown, "Fetching recent changes");

        match cursor {
            None => {
                let page = self.source.recent_changes(None, self.page_size).await?;
                let newest = page.newest.ok_or(FetchError::SourceUnavailable)?;
                Ok(FetchedChanges {
                    changes: Vec::new(),
                    cursor: newest,
                })
            }
            Some(cursor) => {
                let page = self
                    .source
                    .recent_changes(Some(&cursor.timestamp), self.page_size)
                    .await?;
                let raw_len = page.raw_len();
                let malformed = page.malformed;
                let fetched = select_new(page, cursor);

                if raw_len == self.page_size && fetched.changes.len() == raw_len {
                    tracing::warn!(
                        page_size = self.page_size,
                        "Full page of unseen changes, remainder is left for the next poll"
                    );
                }

                tracing::debug!(
                    raw = raw_len,
                    malformed,
                    new = fetched.changes.len(),
                    next_cursor = %fetched.cursor,
                    "Fetched recent changes"
                );

                Ok(fetched)
            }
        }
    }
}
