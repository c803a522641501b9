//! Error types for the note graph cache.

use thiserror::Error;

/// All errors that can occur within the note graph cache.
#[derive(Debug, Error)]
pub enum NotegraphError {
    /// A note was required to exist in the cache but does not.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// A branch was required to exist in the cache but does not.
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// An attachment was required to exist but could not be loaded.
    #[error("Attachment not found: {0}")]
    AttachmentNotFound(String),

    /// An attribute query used an unknown type or a wire-syntax name such as `#color`.
    #[error("Malformed attribute query: {0}")]
    MalformedQuery(String),

    /// An empty note ID was passed where one is required.
    #[error("Invalid note ID: '{0}'")]
    InvalidNoteId(String),

    /// The transport collaborator failed to deliver a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server could not evaluate a saved search.
    #[error("Search note '{note_id}' failed: {message}")]
    SearchFailed { note_id: String, message: String },

    /// An entity change named an entity kind this cache does not know.
    #[error("Unknown entity name: {0}")]
    UnknownEntity(String),

    /// A row could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias that pins the error type to [`NotegraphError`].
pub type Result<T> = std::result::Result<T, NotegraphError>;

impl NotegraphError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::BranchNotFound(_) => "Note is no longer placed here".to_string(),
            Self::AttachmentNotFound(_) => "Attachment no longer exists".to_string(),
            Self::MalformedQuery(msg) => msg.clone(),
            Self::InvalidNoteId(_) => "Missing note reference".to_string(),
            Self::Transport(e) => format!("Could not reach the server: {e}"),
            Self::SearchFailed { message, .. } => format!("Search failed: {message}"),
            Self::UnknownEntity(name) => format!("Unsupported change '{name}'"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Io(e) => format!("File error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_failed_message_names_note() {
        let e = NotegraphError::SearchFailed {
            note_id: "search1".to_string(),
            message: "bad query".to_string(),
        };
        assert_eq!(e.to_string(), "Search note 'search1' failed: bad query");
        assert_eq!(e.user_message(), "Search failed: bad query");
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: NotegraphError = parse_err.into();
        assert!(matches!(e, NotegraphError::Json(_)));
    }
}
