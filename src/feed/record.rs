use super::cursor::Cursor;
use serde::{Deserialize, Serialize};

/// Kind of entry in the recent changes log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    New,
    Edit,
    Log,
    /// `external`, `categorize` and anything the wiki adds later
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    #[serde(default)]
    pub target_title: Option<String>,
}

/// One entry of `list=recentchanges`.
///
/// Only `rcid` and `timestamp` are required: they position the cursor, so an
/// entry without them is dropped when the page is decoded. Everything else is
/// optional here and checked by the formatter, which suppresses the single
/// record if a field it needs is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "rcid")]
    pub id: u64,
    pub timestamp: String,
    #[serde(rename = "ns", default)]
    pub namespace: Option<i64>,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub logtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    /// Present (usually as an empty string) only when the edit was flagged as
    /// a bot edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "oldlen", default)]
    pub old_length: Option<i64>,
    #[serde(rename = "newlen", default)]
    pub new_length: Option<i64>,
    #[serde(default)]
    pub revid: Option<u64>,
    #[serde(default)]
    pub old_revid: Option<u64>,
    #[serde(default)]
    pub logparams: Option<LogParams>,
}

fn default_kind() -> ChangeKind {
    ChangeKind::Other
}

impl ChangeRecord {
    /// Whether the source flagged this change as automated.
    ///
    /// An explicit `false` (formatversion=2 responses) is not a bot flag.
    pub fn is_bot(&self) -> bool {
        !matches!(self.bot, None | Some(serde_json::Value::Bool(false)))
    }

    pub fn is_log(&self) -> bool {
        self.kind == ChangeKind::Log
    }

    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.timestamp.clone(), self.id)
    }
}
