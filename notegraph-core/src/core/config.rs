//! Tunables for [`GraphCache`](super::cache::GraphCache).
//!
//! Stored as camelCase JSON so the same file can be shared with the web
//! front-end that embeds the cache.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default retention window for coalesced blob fetches.
pub const DEFAULT_BLOB_RETENTION_MS: u64 = 1_000;

/// Default buffer size of the change-notification channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Runtime configuration of the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// How long a resolved blob stays shareable before it is evicted, in milliseconds.
    pub blob_retention_ms: u64,
    /// How many notifications a slow subscriber may lag behind before dropping some.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            blob_retention_ms: DEFAULT_BLOB_RETENTION_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blob retention window.
    #[must_use]
    pub fn with_blob_retention(mut self, retention: Duration) -> Self {
        self.blob_retention_ms = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the notification channel capacity. Zero is bumped to one.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// The blob retention window as a [`Duration`].
    pub fn blob_retention(&self) -> Duration {
        Duration::from_millis(self.blob_retention_ms)
    }

    /// Loads configuration from `path`; returns defaults if the file is missing or corrupt.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring corrupt cache config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotegraphError::Io`] if the directory or file cannot be
    /// written, or [`crate::NotegraphError::Json`] if serialization fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
