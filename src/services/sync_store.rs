//! File-backed shared storage for cross-device sync records
//!
//! One JSON file per user. Writes go to a temporary file first and are
//! renamed into place, so readers never observe a half-written record.
//! Concurrent writers follow last-write-wins.

use std::{io::ErrorKind, path::PathBuf};

use tokio::fs;
use tracing::debug;

use crate::{
    error::{Result, TimerError},
    state::SyncRecord,
};

#[derive(Debug, Clone)]
pub struct SyncStore {
    dir: PathBuf,
}

impl SyncStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.local/share/workout-timer/sync` or the platform equivalent
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workout-timer")
            .join("sync")
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn record_path(&self, user: &str) -> PathBuf {
        let key: String = user
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", key))
    }

    /// Read the user's record; `None` when no countdown is shared
    pub async fn load(&self, user: &str) -> Result<Option<SyncRecord>> {
        let path = self.record_path(user);
        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(TimerError::ReadRecord { path, source }),
        };
        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|source| TimerError::ParseRecord { path, source })
    }

    pub async fn save(&self, user: &str, record: &SyncRecord) -> Result<()> {
        let path = self.record_path(user);
        let tmp = path.with_extension("json.tmp");
        let write_err = |source| TimerError::WriteRecord {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).await.map_err(write_err)?;
        let contents = serde_json::to_vec_pretty(record)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        fs::write(&tmp, contents).await.map_err(write_err)?;
        fs::rename(&tmp, &path).await.map_err(write_err)?;

        debug!("Saved sync record to {}", path.display());
        Ok(())
    }

    pub async fn clear(&self, user: &str) -> Result<()> {
        let path = self.record_path(user);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed sync record {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TimerError::WriteRecord { path, source }),
        }
    }
}
