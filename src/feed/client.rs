use crate::config::types::WikiConfig;
use crate::feed::cursor::Cursor;
use crate::feed::record::ChangeRecord;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Properties requested for every change; `loginfo` carries `logtype` and
/// `logparams`, `flags` carries `bot`.
const RC_PROPS: &str = "user|comment|timestamp|sizes|title|flags|ids|loginfo";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("wiki returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode recent changes response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("wiki API error [{code}]: {info}")]
    Api { code: String, info: String },

    #[error("recent changes log is empty")]
    SourceUnavailable,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e)
        } else {
            FetchError::Http(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// One newest-first page of the change log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangePage {
    /// Entries that decoded cleanly, newest first.
    pub changes: Vec<ChangeRecord>,
    /// Position of the newest raw entry, even if that entry was dropped.
    pub newest: Option<Cursor>,
    /// Entries dropped because they did not decode.
    pub malformed: usize,
}

/// The fields an entry needs to position the cursor.
#[derive(Debug, Deserialize)]
struct EntryPosition {
    rcid: u64,
    timestamp: String,
}

impl ChangePage {
    /// Decode raw `recentchanges` entries one at a time.
    ///
    /// A malformed entry is logged and dropped without touching its
    /// neighbours. The page only fails when its newest entry cannot even
    /// supply an id and timestamp, since the cursor could not move past it.
    pub fn from_entries(entries: Vec<serde_json::Value>) -> Result<Self> {
        let mut page = ChangePage::default();

        for (index, entry) in entries.iter().enumerate() {
            match ChangeRecord::deserialize(entry) {
                Ok(record) => {
                    if index == 0 {
                        page.newest = Some(record.cursor());
                    }
                    page.changes.push(record);
                }
                Err(e) => {
                    if index == 0 {
                        let position = EntryPosition::deserialize(entry)?;
                        page.newest = Some(Cursor::new(position.timestamp, position.rcid));
                    }
                    tracing::warn!(
                        rcid = %entry.get("rcid").unwrap_or(&serde_json::Value::Null),
                        error = %e,
                        "Dropping malformed change record"
                    );
                    page.malformed += 1;
                }
            }
        }

        Ok(page)
    }

    /// Number of entries the source returned, decoded or not.
    pub fn raw_len(&self) -> usize {
        self.changes.len() + self.malformed
    }
}

impl From<Vec<ChangeRecord>> for ChangePage {
    fn from(changes: Vec<ChangeRecord>) -> Self {
        Self {
            newest: changes.first().map(ChangeRecord::cursor),
            changes,
            malformed: 0,
        }
    }
}

/// Read side of a wiki's change log.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Return up to `limit` of the most recent changes, newest first.
    ///
    /// `end` is an inclusive lower bound on the timestamp, in the source's
    /// `YYYY-MM-DDTHH:MM:SSZ` format.
    async fn recent_changes(&self, end: Option<&str>, limit: usize) -> Result<ChangePage>;
}

#[derive(Debug, Deserialize)]
struct RecentChangesResponse {
    #[serde(default)]
    query: Option<RecentChangesQuery>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RecentChangesQuery {
    recentchanges: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

/// HTTP client for a MediaWiki `api.php` endpoint
#[derive(Debug)]
pub struct MediaWikiClient {
    api_url: Url,
    client: reqwest::Client,
}

impl MediaWikiClient {
    pub fn new(config: &WikiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            client,
        })
    }

    fn query_pairs(end: Option<&str>, limit: usize) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("action", "query".to_string()),
            ("list", "recentchanges".to_string()),
            ("rcdir", "older".to_string()),
            ("format", "json".to_string()),
            ("rcprop", RC_PROPS.to_string()),
            ("continue", String::new()),
            ("rclimit", limit.to_string()),
        ];
        if let Some(end) = end {
            pairs.push(("rcend", end.to_string()));
        }
        pairs
    }
}

#[async_trait]
impl ChangeSource for MediaWikiClient {
    async fn recent_changes(&self, end: Option<&str>, limit: usize) -> Result<ChangePage> {
        let response = self
            .client
            .get(self.api_url.clone())
            .query(&Self::query_pairs(end, limit))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let parsed: RecentChangesResponse = serde_json::from_str(&body)?;

        if let Some(error) = parsed.error {
            return Err(FetchError::Api {
                code: error.code,
                info: error.info,
            });
        }

        match parsed.query {
            Some(query) => ChangePage::from_entries(query.recentchanges),
            None => Err(FetchError::Api {
                code: "missing_query".to_string(),
                info: "response has neither 'query' nor 'error'".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn test_config() -> WikiConfig {
        WikiConfig {
            api_url: Url::parse("https://wiki.example.org/api.php").unwrap(),
            base_url: Url::parse("https://wiki.example.org/").unwrap(),
            user_agent: "wikiwatch-test".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_client_keeps_api_url() {
        let client = MediaWikiClient::new(&test_config()).unwrap();
        assert_eq!(client.api_url.as_str(), "https://wiki.example.org/api.php");
    }

    #[test]
    fn test_query_pairs_without_bound() {
        let pairs = MediaWikiClient::query_pairs(None, 500);
        assert!(pairs.contains(&("rclimit", "500".to_string())));
        assert!(pairs.contains(&("rcdir", "older".to_string())));
        assert!(pairs.iter().all(|(k, _)| *k != "rcend"));
    }

    #[test]
    fn test_query_pairs_with_bound() {
        let pairs = MediaWikiClient::query_pairs(Some("2024-05-01T10:00:00Z"), 50);
        assert!(pairs.contains(&("rcend", "2024-05-01T10:00:00Z".to_string())));
        assert!(pairs.contains(&("rclimit", "50".to_string())));
    }

    #[test]
    fn test_decode_api_error_body() {
        let parsed: RecentChangesResponse = serde_json::from_str(
            r#"{"error": {"code": "maxlag", "info": "Waiting for a database server"}}"#,
        )
        .unwrap();
        assert!(parsed.query.is_none());
        assert_eq!(parsed.error.unwrap().code, "maxlag");
    }

    fn entry(id: u64) -> serde_json::Value {
        json!({
            "type": "edit", "rcid": id, "timestamp": format!("2024-05-01T10:00:{:02}Z", id),
            "title": format!("Page {}", id), "user": "Alice", "oldlen": 1, "newlen": 2
        })
    }

    #[test]
    fn test_malformed_entry_is_dropped_alone() {
        let mut bad = entry(11);
        bad["oldlen"] = json!("x");

        let page = ChangePage::from_entries(vec![entry(12), bad, entry(10)]).unwrap();

        let ids: Vec<u64> = page.changes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![12, 10]);
        assert_eq!(page.malformed, 1);
        assert_eq!(page.raw_len(), 3);
        assert_eq!(page.newest, Some(Cursor::new("2024-05-01T10:00:12Z", 12)));
    }

    #[test]
    fn test_malformed_newest_entry_still_positions_cursor() {
        let mut bad = entry(12);
        bad["title"] = json!(42);

        let page = ChangePage::from_entries(vec![bad, entry(11)]).unwrap();

        assert_eq!(page.changes.len(), 1);
        assert_eq!(page.newest, Some(Cursor::new("2024-05-01T10:00:12Z", 12)));
    }

    #[test]
    fn test_newest_entry_without_position_fails_page() {
        let result = ChangePage::from_entries(vec![json!({ "type": "edit" }), entry(11)]);
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn test_empty_entries_have_no_position() {
        let page = ChangePage::from_entries(Vec::new()).unwrap();
        assert_eq!(page.raw_len(), 0);
        assert_eq!(page.newest, None);
    }
}
