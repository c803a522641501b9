//! Row shapes exchanged with the server.
//!
//! Field names serialize in camelCase exactly as the server sends them; the
//! cache keeps most values verbatim, so every row must round-trip unchanged.

use crate::{AttributeType, NoteType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One note as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRow {
    pub note_id: String,
    pub title: String,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub mime: String,
    #[serde(default)]
    pub blob_id: String,
}

/// One parent→child edge as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRow {
    pub branch_id: String,
    pub note_id: String,
    pub parent_note_id: String,
    pub note_position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub from_search_note: bool,
}

/// One label or relation as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRow {
    pub attribute_id: String,
    pub note_id: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub is_inheritable: bool,
}

/// Response of a tree or subtree load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtreeResponse {
    #[serde(default)]
    pub notes: Vec<NoteRow>,
    #[serde(default)]
    pub branches: Vec<BranchRow>,
    #[serde(default)]
    pub attributes: Vec<AttributeRow>,
}

/// Response of evaluating a saved search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNoteResponse {
    #[serde(default)]
    pub search_result_note_ids: Vec<String>,
    #[serde(default)]
    pub highlighted_tokens: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Content of a note or attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRow {
    pub blob_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_length: i64,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub utc_date_modified: String,
}

/// One attachment as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRow {
    pub attachment_id: String,
    pub owner_id: String,
    pub role: String,
    pub mime: String,
    pub title: String,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default)]
    pub blob_id: String,
    #[serde(default)]
    pub date_modified: String,
    #[serde(default)]
    pub utc_date_modified: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_date_scheduled_for_erasure_since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,
}

/// A server-side change notification for one entity.
///
/// `entity` holds the row in the shape matching `entity_name`; it is absent
/// when the entity has been erased.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityChange {
    pub entity_name: String,
    pub entity_id: String,
    #[serde(default)]
    pub entity: Option<serde_json::Value>,
    #[serde(default)]
    pub is_erased: bool,
    #[serde(default)]
    pub component_id: Option<String>,
    /// Owning note for revision changes.
    #[serde(default)]
    pub note_id: Option<String>,
    /// `branchId → notePosition` for `note_reordering` changes.
    #[serde(default)]
    pub positions: Option<HashMap<String, i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_row_uses_wire_field_names() {
        let json = r#"{"noteId":"n1","title":"T","isProtected":false,"type":"book","mime":"","blobId":"b1"}"#;
        let row: NoteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.note_type, NoteType::Book);

        let back = serde_json::to_value(&row).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(json).unwrap());
    }

    #[test]
    fn test_branch_row_optional_fields_default() {
        let row: BranchRow = serde_json::from_str(
            r#"{"branchId":"b","noteId":"c","parentNoteId":"p","notePosition":20}"#,
        )
        .unwrap();
        assert_eq!(row.prefix, None);
        assert!(!row.is_expanded);
        assert!(!row.from_search_note);
    }

    #[test]
    fn test_attribute_row_type_field() {
        let row: AttributeRow = serde_json::from_str(
            r#"{"attributeId":"a","noteId":"n","type":"relation","name":"template","value":"t","position":10,"isInheritable":false}"#,
        )
        .unwrap();
        assert_eq!(row.attribute_type, AttributeType::Relation);
        assert!(serde_json::to_string(&row).unwrap().contains(r#""type":"relation""#));
    }
}
