//! Parent→child edges of the note graph.

use crate::core::note::ROOT_NOTE_ID;
use crate::BranchRow;
use serde::{Deserialize, Serialize};

/// Prefix of branch IDs synthesized for saved-search results.
pub const VIRTUAL_BRANCH_PREFIX: &str = "virt-";

/// One placement of a note under a parent.
///
/// A cloned note has one branch per parent. Branches synthesized from a saved
/// search are marked `from_search_note` and are never sent by the server as
/// real tree edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_id: String,
    /// Child note.
    pub note_id: String,
    pub parent_note_id: String,
    /// Sort key among siblings, normally spaced in steps of 10.
    pub note_position: i64,
    pub prefix: Option<String>,
    pub is_expanded: bool,
    pub from_search_note: bool,
}

impl Branch {
    pub fn from_row(row: BranchRow) -> Self {
        Self {
            branch_id: row.branch_id,
            note_id: row.note_id,
            parent_note_id: row.parent_note_id,
            note_position: row.note_position,
            prefix: row.prefix,
            is_expanded: row.is_expanded,
            from_search_note: row.from_search_note,
        }
    }

    /// Converts back into the wire row, e.g. to replay it through reconciliation.
    pub fn to_row(&self) -> BranchRow {
        BranchRow {
            branch_id: self.branch_id.clone(),
            note_id: self.note_id.clone(),
            parent_note_id: self.parent_note_id.clone(),
            note_position: self.note_position,
            prefix: self.prefix.clone(),
            is_expanded: self.is_expanded,
            from_search_note: self.from_search_note,
        }
    }

    /// The deterministic ID of the edge between a saved search and one of its results.
    pub fn virtual_id(search_note_id: &str, result_note_id: &str) -> String {
        format!("{VIRTUAL_BRANCH_PREFIX}{search_note_id}-{result_note_id}")
    }

    /// True for edges that exist only as saved-search results.
    pub fn is_virtual(&self) -> bool {
        self.from_search_note || self.branch_id.starts_with(VIRTUAL_BRANCH_PREFIX)
    }

    /// True when the branch places its note directly under the root.
    pub fn is_top_level(&self) -> bool {
        self.parent_note_id == ROOT_NOTE_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_id_is_deterministic() {
        assert_eq!(Branch::virtual_id("s1", "n7"), "virt-s1-n7");
        assert_eq!(Branch::virtual_id("s1", "n7"), Branch::virtual_id("s1", "n7"));
    }

    #[test]
    fn test_row_round_trip_and_flags() {
        let row = BranchRow {
            branch_id: "b1".to_string(),
            note_id: "child".to_string(),
            parent_note_id: "root".to_string(),
            note_position: 10,
            prefix: Some("Draft".to_string()),
            is_expanded: true,
            from_search_note: false,
        };
        let branch = Branch::from_row(row.clone());
        assert!(branch.is_top_level());
        assert!(!branch.is_virtual());
        assert_eq!(branch.to_row(), row);
    }
}
