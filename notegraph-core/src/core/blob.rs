//! Note and attachment content, plus coalescing of concurrent content fetches.

use crate::{BlobRow, Transport};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Parses the server's `YYYY-MM-DD HH:MM:SS.mmmZ` timestamps.
pub(crate) fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Owner kind of a blob, as used in content URLs and coalescing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobEntity {
    Notes,
    Attachments,
}

impl BlobEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Attachments => "attachments",
        }
    }
}

impl fmt::Display for BlobEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content of a note or attachment at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub blob_id: String,
    pub content: String,
    pub content_length: i64,
    pub date_modified: String,
    pub utc_date_modified: String,
}

impl Blob {
    pub fn from_row(row: BlobRow) -> Self {
        Self {
            blob_id: row.blob_id,
            content: row.content,
            content_length: row.content_length,
            date_modified: row.date_modified,
            utc_date_modified: row.utc_date_modified,
        }
    }

    /// Content parsed as JSON. Empty or malformed content yields `None`; the latter is logged.
    pub fn json_content(&self) -> Option<serde_json::Value> {
        if self.content.is_empty() {
            return None;
        }
        match serde_json::from_str(&self.content) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Cannot parse content of blob '{}' as JSON: {e}", self.blob_id);
                None
            }
        }
    }

    pub fn utc_date_modified(&self) -> Option<DateTime<Utc>> {
        parse_utc_timestamp(&self.utc_date_modified)
    }
}

type SharedBlob = Shared<BoxFuture<'static, Option<Arc<Blob>>>>;

struct Slot {
    generation: u64,
    future: SharedBlob,
}

/// Coalesces concurrent content requests per `(entity type, entity id)`.
///
/// The first caller starts the fetch and every caller arriving before the
/// retention window elapses shares its result. Failed fetches are logged and
/// resolve to `None` for all sharers.
pub struct BlobCache {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
    next_generation: AtomicU64,
    retention: Duration,
}

impl fmt::Debug for BlobCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobCache")
            .field("pending", &self.len())
            .field("retention", &self.retention)
            .finish()
    }
}

impl BlobCache {
    pub fn new(retention: Duration) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            retention,
        }
    }

    pub fn key(entity: BlobEntity, entity_id: &str) -> String {
        format!("{}-{entity_id}", entity.as_str())
    }

    /// Number of keys currently shareable.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the content of `entity_id`, joining an in-flight or recently
    /// resolved fetch for the same key when there is one.
    ///
    /// Must be called within a Tokio runtime: eviction runs on a spawned timer.
    pub async fn get<T: Transport + 'static>(
        &self,
        transport: &Arc<T>,
        entity: BlobEntity,
        entity_id: &str,
    ) -> Option<Arc<Blob>> {
        let key = Self::key(entity, entity_id);
        let future = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(&key) {
                log::trace!("Joining content fetch for {key}");
                slot.future.clone()
            } else {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let future = self.fetch(Arc::clone(transport), entity, entity_id.to_string(), key.clone(), generation);
                slots.insert(
                    key.clone(),
                    Slot {
                        generation,
                        future: future.clone(),
                    },
                );
                future
            }
        };
        future.await
    }

    fn fetch<T: Transport + 'static>(
        &self,
        transport: Arc<T>,
        entity: BlobEntity,
        entity_id: String,
        key: String,
        generation: u64,
    ) -> SharedBlob {
        let slots = Arc::clone(&self.slots);
        let retention = self.retention;

        async move {
            let blob = match transport.blob(entity, &entity_id).await {
                Ok(row) => Some(Arc::new(Blob::from_row(row))),
                Err(e) => {
                    log::error!("Cannot load content of {key}: {e}");
                    None
                }
            };

            tokio::spawn(async move {
                tokio::time::sleep(retention).await;
                let mut slots = slots.lock().unwrap_or_else(PoisonError::into_inner);
                // A newer fetch for the same key owns the slot now.
                if slots.get(&key).is_some_and(|slot| slot.generation == generation) {
                    slots.remove(&key);
                }
            });

            blob
        }
        .boxed()
        .shared()
    }

    /// Evicts every key; pending sharers still receive their result.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if !slots.is_empty() {
            log::debug!("Evicted all {} cached content fetches", slots.len());
            slots.clear();
        }
    }

    /// Evicts every key mentioning `entity_id`, so the next request refetches.
    pub fn invalidate_matching(&self, entity_id: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|key, _| !key.contains(entity_id));
        if slots.len() != before {
            log::debug!("Evicted {} cached content fetches for '{entity_id}'", before - slots.len());
        }
    }
}
