pub mod client;
pub mod cursor;
pub mod fetcher;
pub mod record;

pub use client::{ChangePage, ChangeSource, FetchError, MediaWikiClient};
pub use cursor::Cursor;
pub use fetcher::{FeedFetcher, FetchedChanges};
pub use record::{ChangeKind, ChangeRecord};
