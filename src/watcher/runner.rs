use crate::config::types::FeedConfig;
use crate::feed::client::{ChangeSource, FetchError};
use crate::feed::cursor::Cursor;
use crate::feed::fetcher::FeedFetcher;
use crate::feed::record::ChangeRecord;
use crate::format::bot::BotBurstAggregator;
use crate::format::change::{reject_control_characters, ChangeFormatter, FormatError, FormatOutcome};
use crate::storage::cursor_store::{CursorStore, CursorStoreError};
use crate::watcher::sink::LineSink;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to write to output: {0}")]
    Sink(#[from] std::io::Error),

    #[error("cursor store error: {0}")]
    CursorStore(#[from] CursorStoreError),
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub poll_interval: Duration,
    pub skip_namespaces: Vec<i64>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

impl From<&FeedConfig> for WatchSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            skip_namespaces: config.skip_namespaces.clone(),
        }
    }
}

/// What a single iteration of the watcher did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The starting position was established; nothing was emitted.
    Bootstrapped(Cursor),
    /// A batch was processed and `emitted` lines were written.
    Polled { emitted: usize, cursor: Cursor },
}

/// Polls the change feed and writes notifications to a sink.
///
/// Owns the cursor and the per-interval bot burst state; nothing else reads or
/// writes either.
pub struct Watcher<S, K> {
    fetcher: FeedFetcher<S>,
    formatter: ChangeFormatter,
    aggregator: BotBurstAggregator,
    sink: K,
    settings: WatchSettings,
    cursor: Option<Cursor>,
    store: Option<CursorStore>,
}

impl<S: ChangeSource, K: LineSink> Watcher<S, K> {
    pub fn new(
        fetcher: FeedFetcher<S>,
        formatter: ChangeFormatter,
        sink: K,
        settings: WatchSettings,
    ) -> Self {
        Self {
            fetcher,
            formatter,
            aggregator: BotBurstAggregator::new(),
            sink,
            settings,
            cursor: None,
            store: None,
        }
    }

    /// Persist the cursor to `store` after every processed batch.
    pub fn with_cursor_store(mut self, store: CursorStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Start from a previously saved cursor instead of bootstrapping.
    pub async fn restore_cursor(&mut self) -> Result<Option<&Cursor>, WatchError> {
        if let Some(store) = &self.store {
            if let Some(cursor) = store.load().await? {
                info!(cursor = %cursor, "Resuming from saved cursor");
                self.cursor = Some(cursor);
            }
        }
        Ok(self.cursor.as_ref())
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one iteration: bootstrap if there is no cursor yet, otherwise
    /// fetch and emit everything after the cursor.
    ///
    /// On error the cursor is left untouched.
    pub async fn step(&mut self) -> Result<StepOutcome, WatchError> {
        let Some(cursor) = self.cursor.clone() else {
            let fetched = self.fetcher.fetch(None).await?;
            info!(cursor = %fetched.cursor, "Established starting position");
            self.commit(fetched.cursor.clone()).await?;
            return Ok(StepOutcome::Bootstrapped(fetched.cursor));
        };

        let fetched = self.fetcher.fetch(Some(&cursor)).await?;
        let lines = self.render_batch(fetched.changes);

        for line in &lines {
            self.sink.emit(line)?;
        }

        self.commit(fetched.cursor).await?;

        Ok(StepOutcome::Polled {
            emitted: lines.len(),
            cursor: self.cursor.clone().unwrap_or(cursor),
        })
    }

    /// Run until `shutdown` flips to true or its sender goes away.
    ///
    /// Fetch failures are logged and retried after the poll interval; only a
    /// broken sink or cursor store ends the loop with an error.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), WatchError> {
        info!(
            interval_secs = self.settings.poll_interval.as_secs_f64(),
            page_size = self.fetcher.page_size(),
            "Watcher started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                result = self.step() => match result {
                    Ok(StepOutcome::Bootstrapped(_)) => {}
                    Ok(StepOutcome::Polled { emitted, cursor }) => {
                        debug!(emitted, cursor = %cursor, "Poll complete");
                    }
                    Err(WatchError::Fetch(e)) => log_fetch_failure(&e),
                    Err(e) => return Err(e),
                },
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Watcher stopped");
        Ok(())
    }

    /// Filter, format and aggregate one batch into output lines, in the
    /// order they are to be written. Resets the bot burst state.
    fn render_batch(&mut self, changes: Vec<ChangeRecord>) -> Vec<String> {
        let mut lines = Vec::new();

        for change in changes {
            if self.is_skipped(&change) {
                info!(rcid = change.id, title = ?change.title, "Skipping user namespace change");
                continue;
            }

            let Some(change) = self.aggregator.offer(change) else {
                continue;
            };

            debug!(rcid = change.id, "Regular change");
            let rendered = self
                .formatter
                .format(&change)
                .and_then(|outcome| match outcome {
                    FormatOutcome::Formatted(line) => reject_control_characters(line).map(Some),
                    FormatOutcome::Suppressed => Ok(None),
                });

            match rendered {
                Ok(Some(line)) => {
                    info!(line = %line, "Formatted");
                    lines.push(line);
                }
                Ok(None) => {
                    warn!(rcid = change.id, change = ?change, "Suppressed unhandled change");
                }
                Err(e) => log_malformed(&change, &e),
            }
        }

        for line in self.aggregator.finish_interval(self.formatter.links()) {
            match reject_control_characters(line) {
                Ok(line) => {
                    info!(line = %line, "Formatted (bot)");
                    lines.push(line);
                }
                Err(e) => warn!(error = %e, "Suppressed bot summary"),
            }
        }

        lines
    }

    fn is_skipped(&self, change: &ChangeRecord) -> bool {
        !change.is_log()
            && change
                .namespace
                .is_some_and(|ns| self.settings.skip_namespaces.contains(&ns))
    }

    async fn commit(&mut self, next: Cursor) -> Result<(), WatchError> {
        match &mut self.cursor {
            Some(current) => {
                if !current.advance_to(next.clone()) {
                    warn!(current = %current, returned = %next, "Fetched cursor is older, keeping current");
                    return Ok(());
                }
            }
            None => self.cursor = Some(next),
        }

        if let (Some(store), Some(cursor)) = (&self.store, &self.cursor) {
            store.save(cursor).await?;
        }
        Ok(())
    }
}

fn log_malformed(change: &ChangeRecord, e: &FormatError) {
    warn!(rcid = change.id, error = %e, change = ?change, "Suppressed malformed change");
}

fn log_fetch_failure(e: &FetchError) {
    match e {
        FetchError::SourceUnavailable => {
            warn!("Recent changes log is empty, retrying after the poll interval")
        }
        FetchError::Http(_) | FetchError::Timeout(_) => {
            error!(error = %e, "Fetching recent changes failed")
        }
        FetchError::Status { status, .. } => {
            error!(status = *status, error = %e, "Wiki returned an error status")
        }
        FetchError::Api { code, info } => {
            error!(code = %code, info = %info, "Wiki API reported an error")
        }
        FetchError::Decode(_) => {
            error!(error = %e, "Unexpected response from the wiki API")
        }
    }
}
