pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# WIKIWATCH CONFIGURATION
# =============================================================================
# Polls a MediaWiki recent changes feed and writes one line per change.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/wikiwatch/config.yml
#   3. /etc/wikiwatch/config.yml
#
# Values may reference environment variables as $env{VAR_NAME}.

# =============================================================================
# WIKI
# =============================================================================
wiki:
  # api.php endpoint queried for list=recentchanges
  api_url: https://wiki.archiveteam.org/api.php
  # Directory containing index.php; links in notifications are built from it.
  # Must end with a slash.
  base_url: https://wiki.archiveteam.org/
  user_agent: wikiwatch (recent changes relay)
  # Requests taking longer than this count as failed polls
  timeout: 5s

# =============================================================================
# FEED
# =============================================================================
feed:
  # Fixed delay between polls. Failed polls are retried after the same delay.
  poll_interval: 60s
  # Changes requested per poll (at most 500). Bursts larger than this are
  # picked up over several polls.
  page_size: 500
  # Non-log changes in these namespaces are not reported (User, User talk).
  # Log entries such as rights changes are still reported.
  skip_namespaces: [2, 3]

# =============================================================================
# OUTPUT
# =============================================================================
# Where notification lines go: 'stdout' or 'file' (appended to 'path').
# Diagnostics are always logged to stderr.
output:
  type: stdout

# =============================================================================
# STATE (optional)
# =============================================================================
# Keep the feed position across restarts. Without this section the watcher
# starts from the newest change every time it is launched.
#
# state:
#   cursor_path: ~/.local/state/wikiwatch/cursor.json
"#
    .to_string()
}
