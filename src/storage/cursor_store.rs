use crate::feed::cursor::Cursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

const CURRENT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CursorStoreError {
    #[error("cursor file I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor file '{path}' is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CursorStoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorCheckpoint {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub cursor: Cursor,
}

/// Keeps the feed cursor in a JSON file between runs.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> CursorStoreError {
        CursorStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the saved cursor. A missing file or a file written by an
    /// incompatible version yields None.
    pub async fn load(&self) -> Result<Option<Cursor>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No saved cursor found");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let checkpoint: CursorCheckpoint =
            serde_json::from_slice(&bytes).map_err(|source| CursorStoreError::Json {
                path: self.path.clone(),
                source,
            })?;

        if checkpoint.version != CURRENT_VERSION {
            tracing::warn!(
                path = %self.path.display(),
                found = checkpoint.version,
                expected = CURRENT_VERSION,
                "Cursor file version mismatch, ignoring it"
            );
            return Ok(None);
        }

        tracing::info!(
            cursor = %checkpoint.cursor,
            saved_at = %checkpoint.saved_at,
            "Loaded saved cursor"
        );
        Ok(Some(checkpoint.cursor))
    }

    /// Save `cursor`, replacing the previous file atomically.
    pub async fn save(&self, cursor: &Cursor) -> Result<()> {
        let checkpoint = CursorCheckpoint {
            version: CURRENT_VERSION,
            saved_at: Utc::now(),
            cursor: cursor.clone(),
        };
        let json = serde_json::to_vec_pretty(&checkpoint).map_err(|source| {
            CursorStoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(cursor = %cursor, "Cursor saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = CursorStore::new(dir.path().join("cursor.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CursorStore::new(dir.path().join("nested/state/cursor.json"));
        let cursor = Cursor::new("2024-05-01T10:00:00Z", 1234);

        store.save(&cursor).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(cursor));

        let newer = Cursor::new("2024-05-01T10:01:00Z", 1240);
        store.save(&newer).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn test_version_mismatch_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cursor.json");
        std::fs::write(
            &path,
            r#"{"version": 999, "saved_at": "2024-05-01T10:00:00Z",
                "cursor": {"timestamp": "2024-05-01T10:00:00Z", "id": 5}}"#,
        )
        .unwrap();

        let store = CursorStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cursor.json");
        std::fs::write(&path, "not json").unwrap();

        let store = CursorStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(CursorStoreError::Json { .. })
        ));
    }
}
