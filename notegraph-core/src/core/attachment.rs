//! Files and images owned by a note.

use crate::core::blob::parse_utc_timestamp;
use crate::AttachmentRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An attachment of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub attachment_id: String,
    /// Owning note.
    pub owner_id: String,
    /// E.g. `image` or `file`.
    pub role: String,
    pub mime: String,
    pub title: String,
    pub is_protected: bool,
    pub blob_id: String,
    pub date_modified: String,
    pub utc_date_modified: String,
    pub utc_date_scheduled_for_erasure_since: Option<String>,
    /// Only sent with some responses.
    pub content_length: Option<i64>,
}

impl Attachment {
    pub fn from_row(row: AttachmentRow) -> Self {
        Self {
            attachment_id: row.attachment_id,
            owner_id: row.owner_id,
            role: row.role,
            mime: row.mime,
            title: row.title,
            is_protected: row.is_protected,
            blob_id: row.blob_id,
            date_modified: row.date_modified,
            utc_date_modified: row.utc_date_modified,
            utc_date_scheduled_for_erasure_since: row.utc_date_scheduled_for_erasure_since,
            content_length: row.content_length,
        }
    }

    pub(crate) fn update(&mut self, row: AttachmentRow) {
        *self = Self::from_row(row);
    }

    pub fn utc_date_modified(&self) -> Option<DateTime<Utc>> {
        parse_utc_timestamp(&self.utc_date_modified)
    }

    /// When the attachment was orphaned and queued for erasure, if it was.
    pub fn utc_date_scheduled_for_erasure_since(&self) -> Option<DateTime<Utc>> {
        self.utc_date_scheduled_for_erasure_since
            .as_deref()
            .and_then(parse_utc_timestamp)
    }
}
