//! Relays a MediaWiki recent changes feed as one-line notifications.
//!
//! The [`watcher::Watcher`] polls the wiki through a [`feed::FeedFetcher`],
//! formats each new change with [`format::ChangeFormatter`], collapses bursts
//! of bot edits with [`format::BotBurstAggregator`] and writes the result to a
//! [`watcher::LineSink`].

pub mod cli;
pub mod config;
pub mod feed;
pub mod format;
pub mod storage;
pub mod watcher;
