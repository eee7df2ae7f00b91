use crate::feed::record::ChangeRecord;
use crate::format::links::LinkBuilder;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;

const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const OFFSET_FORMAT: &str = "%Y%m%d%H%M%S";
const OFFSET_LEN: usize = 14;

/// Contributions offset one second past `timestamp`, so that the change at
/// `timestamp` itself is included in the listing.
///
/// The second is added as a real time step, so `23:59:59` rolls over into the
/// next day instead of producing `...235960`. Returns None if the timestamp
/// cannot be turned into a 14 digit offset.
pub fn contributions_offset(timestamp: &str) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(timestamp, SOURCE_TIMESTAMP_FORMAT).ok()?;
    let offset = parsed
        .checked_add_signed(Duration::seconds(1))?
        .format(OFFSET_FORMAT)
        .to_string();

    if offset.len() == OFFSET_LEN && offset.bytes().all(|b| b.is_ascii_digit()) {
        Some(offset)
    } else {
        None
    }
}

/// Summary line for the collapsed bot changes of one user.
pub fn format_bot_burst(user: &str, changes: &[ChangeRecord], links: &LinkBuilder) -> String {
    let count = changes.len();
    let offset = changes
        .last()
        .and_then(|newest| contributions_offset(&newest.timestamp));

    match offset {
        Some(offset) => format!(
            "{} made {} bot changes: {}",
            user,
            count,
            links.contributions(user, &offset, count)
        ),
        None => format!(
            "{} made {} bot changes but I couldn't generate a link for them.",
            user, count
        ),
    }
}

/// Collapses bursts of bot edits within one polling interval.
///
/// The first bot change of a user in an interval is passed through to be
/// formatted as usual; later ones are held back and summarised by
/// [`finish_interval`](Self::finish_interval), which also resets all state.
#[derive(Debug, Default)]
pub struct BotBurstAggregator {
    counts: HashMap<String, usize>,
    /// Buffered changes per user, in order of each user's first buffered change
    buffered: Vec<(String, Vec<ChangeRecord>)>,
}

impl BotBurstAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one change.
    ///
    /// Returns the change back if it should be formatted now, or None if it
    /// was buffered for the interval summary.
    pub fn offer(&mut self, change: ChangeRecord) -> Option<ChangeRecord> {
        if !change.is_bot() {
            return Some(change);
        }
        let Some(user) = change.user.clone() else {
            return Some(change);
        };

        let count = self.counts.entry(user.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            return Some(change);
        }

        tracing::info!(rcid = change.id, user = %user, "Collapsing bot change");
        match self.buffered.iter_mut().find(|(name, _)| *name == user) {
            Some((_, changes)) => changes.push(change),
            None => self.buffered.push((user, vec![change])),
        }
        None
    }

    /// Number of bot changes seen for `user` in the current interval.
    #[cfg(test)]
    fn count(&self, user: &str) -> usize {
        self.counts.get(user).copied().unwrap_or(0)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Summary lines for everything buffered this interval.
    ///
    /// Counters and buffers are cleared whether or not anything was buffered.
    pub fn finish_interval(&mut self, links: &LinkBuilder) -> Vec<String> {
        self.counts.clear();
        std::mem::take(&mut self.buffered)
            .into_iter()
            .map(|(user, changes)| format_bot_burst(&user, &changes, links))
            .collect()
    }
}
