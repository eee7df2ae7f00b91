pub mod generate;
pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub use parse::{load_config, parse_config, ConfigError};
pub use types::{Config, FeedConfig, OutputConfig, StateConfig, WikiConfig};

/// `$env{VAR_NAME}` references in config files
pub(crate) static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// Replaces `$env{VAR_NAME}` with the value of the variable.
/// Unset variables are left in place so they can be reported.
pub fn expand_env_vars(text: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Resolves the config file path. Returns the first of:
/// 1. the explicit path (with tilde expansion)
/// 2. ~/.config/wikiwatch/config.yml
/// 3. /etc/wikiwatch/config.yml
///
/// that exists, or None.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(path) = user_config_path() {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = system_config_path();
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config/wikiwatch/config.yml"))
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc/wikiwatch/config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("WIKIWATCH_TEST_STATE_DIR", "/var/lib/wikiwatch");
        let result = expand_env_vars("cursor_path: $env{WIKIWATCH_TEST_STATE_DIR}/cursor.json");
        assert_eq!(result, "cursor_path: /var/lib/wikiwatch/cursor.json");
        std::env::remove_var("WIKIWATCH_TEST_STATE_DIR");
    }

    #[test]
    fn test_expand_env_vars_leaves_unset() {
        let result = expand_env_vars("user_agent: $env{WIKIWATCH_TEST_NOT_SET}");
        assert_eq!(result, "user_agent: $env{WIKIWATCH_TEST_NOT_SET}");
    }

    #[test]
    fn test_expand_env_vars_ignores_plain_dollar_braces() {
        assert_eq!(expand_env_vars("${user} made ${n}"), "${user} made ${n}");
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/state/cursor.json")), home.join("state/cursor.json"));
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
        assert_eq!(expand_tilde(Path::new("/abs/cursor.json")), Path::new("/abs/cursor.json"));
        assert_eq!(expand_tilde(Path::new("rel/~x")), Path::new("rel/~x"));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let resolved = resolve_config_path(Some(Path::new("/tmp/wikiwatch.yml")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/wikiwatch.yml")));
    }
}
