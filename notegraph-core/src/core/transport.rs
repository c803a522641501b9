//! The server-facing collaborator of [`GraphCache`](crate::GraphCache).

use crate::{AttachmentRow, BlobEntity, BlobRow, Result, SearchNoteResponse, SubtreeResponse};
use async_trait::async_trait;

/// Fetches graph rows and content from the server.
///
/// Implementations map their own failures to
/// [`NotegraphError::Transport`](crate::NotegraphError::Transport); the cache
/// propagates them unchanged, except for content fetches (see
/// [`BlobCache`](crate::BlobCache)).
#[async_trait]
pub trait Transport: Send + Sync {
    /// The whole tree, or the subtree below `sub_tree_note_id`.
    async fn load_tree(&self, sub_tree_note_id: Option<&str>) -> Result<SubtreeResponse>;

    /// The given notes with their edges and attributes.
    async fn load_notes(&self, note_ids: &[String]) -> Result<SubtreeResponse>;

    /// Evaluates the saved search stored in `note_id`.
    async fn search_note(&self, note_id: &str) -> Result<SearchNoteResponse>;

    async fn blob(&self, entity: BlobEntity, entity_id: &str) -> Result<BlobRow>;

    async fn note_attachments(&self, note_id: &str) -> Result<Vec<AttachmentRow>>;

    /// Every attachment of the note owning `attachment_id`, that one included.
    async fn attachment_siblings(&self, attachment_id: &str) -> Result<Vec<AttachmentRow>>;
}
