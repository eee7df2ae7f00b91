use crate::config::parse::load_config;
use crate::config::types::Config;
use crate::feed::client::MediaWikiClient;
use crate::feed::fetcher::FeedFetcher;
use crate::format::change::ChangeFormatter;
use crate::format::links::LinkBuilder;
use crate::storage::cursor_store::CursorStore;
use crate::watcher::runner::{WatchSettings, Watcher};
use crate::watcher::sink::open_sink;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("wiki client error: {0}")]
    Client(#[from] crate::feed::client::FetchError),

    #[error("failed to open output: {0}")]
    Output(#[from] std::io::Error),

    #[error("watcher error: {0}")]
    Watcher(#[from] crate::watcher::runner::WatchError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/wikiwatch/config.yml");
            eprintln!("  /etc/wikiwatch/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'wikiwatch config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_watcher(&config_path).await.map_err(|e| e.into())
}

async fn run_watcher(config_path: &Path) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let mut watcher = build_watcher(&config)?;
    watcher.restore_cursor().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!(api_url = %config.wiki.api_url, "Watching recent changes, press Ctrl+C to stop");
    let mut watcher_handle = tokio::spawn(watcher.run(shutdown_rx));

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
        result = &mut watcher_handle => {
            // The watcher only returns on its own when output is broken
            return match result? {
                Ok(()) => Ok(()),
                Err(e) => {
                    error!(error = %e, "Watcher stopped with an error");
                    Err(e.into())
                }
            };
        }
    }

    watcher_handle.await??;
    info!("Shutdown complete");
    Ok(())
}

fn build_watcher(
    config: &Config,
) -> Result<Watcher<MediaWikiClient, Box<dyn crate::watcher::sink::LineSink>>, RunError> {
    let client = MediaWikiClient::new(&config.wiki)?;
    let fetcher = FeedFetcher::new(client, config.feed.page_size);
    let formatter = ChangeFormatter::new(LinkBuilder::new(config.wiki.base_url.clone()));
    let sink = open_sink(&config.output)?;

    let watcher = Watcher::new(fetcher, formatter, sink, WatchSettings::from(&config.feed));

    Ok(match &config.state {
        Some(state) => {
            info!(path = %state.cursor_path.display(), "Persisting cursor");
            watcher.with_cursor_store(CursorStore::new(&state.cursor_path))
        }
        None => watcher,
    })
}
