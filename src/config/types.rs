use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub wiki: WikiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Where to keep the cursor between runs. Without it every start
    /// bootstraps from the newest change.
    #[serde(default)]
    pub state: Option<StateConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// `api.php` endpoint
    pub api_url: Url,
    /// Directory of `index.php`, used for links in notifications
    pub base_url: Url,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_user_agent() -> String {
    concat!("wikiwatch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Namespaces whose non-log changes are not reported
    #[serde(default = "default_skip_namespaces")]
    pub skip_namespaces: Vec<i64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            page_size: default_page_size(),
            skip_namespaces: default_skip_namespaces(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_page_size() -> usize {
    500
}

fn default_skip_namespaces() -> Vec<i64> {
    // User, User talk
    vec![2, 3]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    #[default]
    Stdout,
    File { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub cursor_path: PathBuf,
}
