//! Fixtures shared by the unit tests: row builders, a graph builder and an
//! in-memory [`Transport`].

use crate::core::note::{NONE_NOTE_ID, ROOT_BRANCH_ID, ROOT_NOTE_ID};
use crate::{
    AttachmentRow, AttributeRow, AttributeType, BlobEntity, BlobRow, BranchRow, Graph, NoteRow,
    NoteType, NotegraphError, Result, SearchNoteResponse, SubtreeResponse, Transport,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

const FIXED_TIMESTAMP: &str = "2024-01-02 03:04:05.000Z";

pub fn note_row(note_id: &str, note_type: NoteType) -> NoteRow {
    let mime = match note_type {
        NoteType::Text => "text/html",
        NoteType::Code => "text/plain",
        NoteType::Image => "image/png",
        _ => "",
    };
    NoteRow {
        note_id: note_id.to_string(),
        title: note_id.to_string(),
        is_protected: false,
        note_type,
        mime: mime.to_string(),
        blob_id: format!("blob-{note_id}"),
    }
}

/// A real branch with ID `{parent}-{child}`.
pub fn branch(parent_note_id: &str, note_id: &str, note_position: i64) -> BranchRow {
    BranchRow {
        branch_id: format!("{parent_note_id}-{note_id}"),
        note_id: note_id.to_string(),
        parent_note_id: parent_note_id.to_string(),
        note_position,
        prefix: None,
        is_expanded: false,
        from_search_note: false,
    }
}

pub fn attr(
    attribute_id: &str,
    note_id: &str,
    attribute_type: AttributeType,
    name: &str,
    value: &str,
    is_inheritable: bool,
) -> AttributeRow {
    AttributeRow {
        attribute_id: attribute_id.to_string(),
        note_id: note_id.to_string(),
        attribute_type,
        name: name.to_string(),
        value: value.to_string(),
        position: 10,
        is_inheritable,
    }
}

pub fn attachment_row(attachment_id: &str, owner_id: &str, role: &str) -> AttachmentRow {
    AttachmentRow {
        attachment_id: attachment_id.to_string(),
        owner_id: owner_id.to_string(),
        role: role.to_string(),
        mime: if role == "image" { "image/png" } else { "application/pdf" }.to_string(),
        title: format!("{attachment_id}.bin"),
        is_protected: false,
        blob_id: format!("blob-{attachment_id}"),
        date_modified: "2024-01-02 04:04:05.000+0100".to_string(),
        utc_date_modified: FIXED_TIMESTAMP.to_string(),
        utc_date_scheduled_for_erasure_since: None,
        content_length: None,
    }
}

/// Collects rows for one [`SubtreeResponse`]. Starts with the root note
/// hanging below its pseudo parent.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    notes: Vec<NoteRow>,
    branches: Vec<BranchRow>,
    attributes: Vec<AttributeRow>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        let mut root_branch = branch(NONE_NOTE_ID, ROOT_NOTE_ID, 0);
        root_branch.branch_id = ROOT_BRANCH_ID.to_string();
        Self {
            notes: vec![note_row(ROOT_NOTE_ID, NoteType::Text)],
            branches: vec![root_branch],
            attributes: Vec::new(),
        }
    }

    pub fn note(mut self, note_id: &str, note_type: NoteType) -> Self {
        self.notes.push(note_row(note_id, note_type));
        self
    }

    pub fn branch(mut self, parent_note_id: &str, note_id: &str, note_position: i64) -> Self {
        self.branches.push(branch(parent_note_id, note_id, note_position));
        self
    }

    /// A saved-search result edge.
    pub fn virtual_branch(mut self, search_note_id: &str, note_id: &str, note_position: i64) -> Self {
        let mut row = branch(search_note_id, note_id, note_position);
        row.branch_id = crate::Branch::virtual_id(search_note_id, note_id);
        row.from_search_note = true;
        self.branches.push(row);
        self
    }

    pub fn label(self, attribute_id: &str, note_id: &str, name: &str, value: &str, is_inheritable: bool) -> Self {
        self.label_at(attribute_id, note_id, name, value, is_inheritable, 10)
    }

    pub fn label_at(
        mut self,
        attribute_id: &str,
        note_id: &str,
        name: &str,
        value: &str,
        is_inheritable: bool,
        position: i64,
    ) -> Self {
        let mut row = attr(attribute_id, note_id, AttributeType::Label, name, value, is_inheritable);
        row.position = position;
        self.attributes.push(row);
        self
    }

    pub fn relation(
        mut self,
        attribute_id: &str,
        note_id: &str,
        name: &str,
        target_note_id: &str,
        is_inheritable: bool,
    ) -> Self {
        self.attributes.push(attr(
            attribute_id,
            note_id,
            AttributeType::Relation,
            name,
            target_note_id,
            is_inheritable,
        ));
        self
    }

    pub fn response(&self) -> SubtreeResponse {
        SubtreeResponse {
            notes: self.notes.clone(),
            branches: self.branches.clone(),
            attributes: self.attributes.clone(),
        }
    }

    pub fn build(self) -> Graph {
        let mut graph = Graph::new();
        graph.add_response(self.response());
        graph
    }
}

#[derive(Default)]
struct ServerState {
    tree: SubtreeResponse,
    searches: HashMap<String, Vec<String>>,
    attachments: Vec<AttachmentRow>,
    blobs: HashMap<String, String>,
    requests: Vec<String>,
    blob_requests: usize,
}

/// In-memory server. Every call is recorded; an optional delay lets tests
/// overlap requests under paused Tokio time.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<ServerState>,
    delay: Duration,
}

impl FakeTransport {
    pub fn with_tree(self, tree: SubtreeResponse) -> Self {
        self.set_tree(tree);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_tree(&self, tree: SubtreeResponse) {
        self.state.lock().unwrap().tree = tree;
    }

    pub fn put_search(&self, search_note_id: &str, result_note_ids: &[&str]) {
        self.state.lock().unwrap().searches.insert(
            search_note_id.to_string(),
            result_note_ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    pub fn put_attachment(&self, row: AttachmentRow) {
        let mut state = self.state.lock().unwrap();
        state.attachments.retain(|a| a.attachment_id != row.attachment_id);
        state.attachments.push(row);
    }

    pub fn put_blob(&self, entity: BlobEntity, entity_id: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(format!("{entity}-{entity_id}"), content.to_string());
    }

    /// Non-content requests in call order, e.g. `load_notes:a,b`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn blob_requests(&self) -> usize {
        self.state.lock().unwrap().blob_requests
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Rows of `note_ids` with every branch touching them, their own
    /// attributes and the relations pointing at them.
    fn rows_for(tree: &SubtreeResponse, note_ids: &HashSet<&str>, branches_by_child_only: bool) -> SubtreeResponse {
        SubtreeResponse {
            notes: tree
                .notes
                .iter()
                .filter(|n| note_ids.contains(n.note_id.as_str()))
                .cloned()
                .collect(),
            branches: tree
                .branches
                .iter()
                .filter(|b| {
                    note_ids.contains(b.note_id.as_str())
                        || (!branches_by_child_only && note_ids.contains(b.parent_note_id.as_str()))
                })
                .cloned()
                .collect(),
            attributes: tree
                .attributes
                .iter()
                .filter(|a| {
                    note_ids.contains(a.note_id.as_str())
                        || (a.attribute_type == AttributeType::Relation && note_ids.contains(a.value.as_str()))
                })
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn load_tree(&self, sub_tree_note_id: Option<&str>) -> Result<SubtreeResponse> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state
            .requests
            .push(format!("load_tree:{}", sub_tree_note_id.unwrap_or("")));

        let Some(top) = sub_tree_note_id else {
            return Ok(state.tree.clone());
        };
        if !state.tree.notes.iter().any(|n| n.note_id == top) {
            return Err(NotegraphError::Transport(format!("Note '{top}' not found")));
        }
        let mut subtree: HashSet<&str> = HashSet::from([top]);
        let mut queue = vec![top];
        while let Some(parent) = queue.pop() {
            for b in state.tree.branches.iter().filter(|b| b.parent_note_id == parent) {
                if subtree.insert(b.note_id.as_str()) {
                    queue.push(b.note_id.as_str());
                }
            }
        }
        Ok(Self::rows_for(&state.tree, &subtree, true))
    }

    async fn load_notes(&self, note_ids: &[String]) -> Result<SubtreeResponse> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.requests.push(format!("load_notes:{}", note_ids.join(",")));
        let wanted: HashSet<&str> = note_ids.iter().map(String::as_str).collect();
        Ok(Self::rows_for(&state.tree, &wanted, false))
    }

    async fn search_note(&self, note_id: &str) -> Result<SearchNoteResponse> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.requests.push(format!("search_note:{note_id}"));
        match state.searches.get(note_id) {
            Some(ids) => Ok(SearchNoteResponse {
                search_result_note_ids: ids.clone(),
                highlighted_tokens: Vec::new(),
                error: None,
            }),
            None => Err(NotegraphError::Transport(format!("No search registered for '{note_id}'"))),
        }
    }

    async fn blob(&self, entity: BlobEntity, entity_id: &str) -> Result<BlobRow> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.blob_requests += 1;
        let content = state
            .blobs
            .get(&format!("{entity}-{entity_id}"))
            .cloned()
            .ok_or_else(|| NotegraphError::Transport(format!("No content for {entity} '{entity_id}'")))?;
        Ok(BlobRow {
            blob_id: format!("blob-{entity_id}"),
            content_length: content.len() as i64,
            content,
            date_modified: FIXED_TIMESTAMP.to_string(),
            utc_date_modified: FIXED_TIMESTAMP.to_string(),
        })
    }

    async fn note_attachments(&self, note_id: &str) -> Result<Vec<AttachmentRow>> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.requests.push(format!("note_attachments:{note_id}"));
        Ok(state
            .attachments
            .iter()
            .filter(|a| a.owner_id == note_id)
            .cloned()
            .collect())
    }

    async fn attachment_siblings(&self, attachment_id: &str) -> Result<Vec<AttachmentRow>> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        state.requests.push(format!("attachment_siblings:{attachment_id}"));
        let owner_id = state
            .attachments
            .iter()
            .find(|a| a.attachment_id == attachment_id)
            .map(|a| a.owner_id.clone())
            .ok_or_else(|| NotegraphError::Transport(format!("Attachment '{attachment_id}' not found")))?;
        Ok(state
            .attachments
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
