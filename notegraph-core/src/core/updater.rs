//! Applies server change notifications to the cached graph.

use crate::core::note::ROOT_NOTE_ID;
use crate::{
    AttachmentRow, AttributeRow, AttributeType, BranchRow, CacheEvent, EntityChange, GraphCache,
    NoteRow, NotegraphError, Result, SubtreeResponse, Transport,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Option whose changes are only noise for the cache.
const IGNORED_OPTIONS: [&str; 1] = ["openNoteContexts"];

/// Which entities one batch of changes affected, and who caused each change.
///
/// Component IDs identify the UI component that triggered a change; `None`
/// means the change did not originate from a known component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResults {
    notes: BTreeMap<String, Vec<Option<String>>>,
    branches: BTreeMap<String, Vec<Option<String>>>,
    attributes: BTreeMap<String, Vec<Option<String>>>,
    note_reordering: BTreeMap<String, Vec<Option<String>>>,
    content_note_ids: BTreeMap<String, Vec<Option<String>>>,
    revisions: Vec<RevisionChange>,
    options: BTreeSet<String>,
    attachment_rows: Vec<AttachmentRow>,
    full_reload_required: bool,
}

/// A revision saved for a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionChange {
    pub revision_id: String,
    pub note_id: Option<String>,
    pub component_id: Option<String>,
}

fn record(map: &mut BTreeMap<String, Vec<Option<String>>>, id: &str, component_id: Option<&str>) {
    let components = map.entry(id.to_string()).or_default();
    let component_id = component_id.map(str::to_string);
    if !components.contains(&component_id) {
        components.push(component_id);
    }
}

fn changed_by_other(
    map: &BTreeMap<String, Vec<Option<String>>>,
    id: &str,
    component_id: Option<&str>,
) -> bool {
    map.get(id)
        .is_some_and(|components| components.iter().any(|c| c.as_deref() != component_id))
}

impl LoadResults {
    pub(crate) fn add_note(&mut self, note_id: &str, component_id: Option<&str>) {
        record(&mut self.notes, note_id, component_id);
    }

    pub(crate) fn add_branch(&mut self, branch_id: &str, component_id: Option<&str>) {
        record(&mut self.branches, branch_id, component_id);
    }

    pub(crate) fn add_attribute(&mut self, attribute_id: &str, component_id: Option<&str>) {
        record(&mut self.attributes, attribute_id, component_id);
    }

    pub(crate) fn add_note_reordering(&mut self, parent_note_id: &str, component_id: Option<&str>) {
        record(&mut self.note_reordering, parent_note_id, component_id);
    }

    pub(crate) fn add_note_content(&mut self, note_id: &str, component_id: Option<&str>) {
        record(&mut self.content_note_ids, note_id, component_id);
    }

    pub(crate) fn add_revision(&mut self, revision_id: &str, note_id: Option<&str>, component_id: Option<&str>) {
        self.revisions.push(RevisionChange {
            revision_id: revision_id.to_string(),
            note_id: note_id.map(str::to_string),
            component_id: component_id.map(str::to_string),
        });
    }

    pub(crate) fn add_option(&mut self, name: &str) {
        self.options.insert(name.to_string());
    }

    pub(crate) fn add_attachment_row(&mut self, row: AttachmentRow) {
        self.attachment_rows.push(row);
    }

    pub(crate) fn require_full_reload(&mut self) {
        self.full_reload_required = true;
    }

    pub fn note_ids(&self) -> impl Iterator<Item = &str> {
        self.notes.keys().map(String::as_str)
    }

    pub fn branch_ids(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(String::as_str)
    }

    pub fn attribute_ids(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Parent notes whose children were reordered.
    pub fn reordered_note_ids(&self) -> impl Iterator<Item = &str> {
        self.note_reordering.keys().map(String::as_str)
    }

    pub fn revisions(&self) -> &[RevisionChange] {
        &self.revisions
    }

    pub fn attachment_rows(&self) -> &[AttachmentRow] {
        &self.attachment_rows
    }

    /// True when the note was changed by someone other than `component_id`.
    pub fn is_note_reloaded(&self, note_id: &str, component_id: Option<&str>) -> bool {
        changed_by_other(&self.notes, note_id, component_id)
    }

    /// True when the note's content was changed by someone other than `component_id`.
    pub fn is_note_content_reloaded(&self, note_id: &str, component_id: Option<&str>) -> bool {
        changed_by_other(&self.content_note_ids, note_id, component_id)
    }

    pub fn is_branch_reloaded(&self, branch_id: &str, component_id: Option<&str>) -> bool {
        changed_by_other(&self.branches, branch_id, component_id)
    }

    pub fn has_revision_for_note(&self, note_id: &str) -> bool {
        self.revisions.iter().any(|r| r.note_id.as_deref() == Some(note_id))
    }

    pub fn is_option_reloaded(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// True if an entity was erased while cached; the graph can no longer be
    /// patched incrementally and should be reloaded with
    /// [`GraphCache::load_initial_tree`].
    pub fn full_reload_required(&self) -> bool {
        self.full_reload_required
    }

    pub fn has_attribute_related_changes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
            && self.branches.is_empty()
            && self.attributes.is_empty()
            && self.note_reordering.is_empty()
            && self.content_note_ids.is_empty()
            && self.revisions.is_empty()
            && self.options.is_empty()
            && self.attachment_rows.is_empty()
            && !self.full_reload_required
    }
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    name: String,
    #[serde(default)]
    value: String,
}

/// The change's entity row, or `None` if it carries none.
fn entity_row<R: DeserializeOwned>(change: &EntityChange) -> Result<Option<R>> {
    change
        .entity
        .as_ref()
        .map(|entity| serde_json::from_value(entity.clone()).map_err(NotegraphError::from))
        .transpose()
}

/// Erased entities carry no row; soft-deleted ones carry `isDeleted` as a bool or 0/1.
fn is_removed(change: &EntityChange) -> bool {
    change.is_erased
        || change
            .entity
            .as_ref()
            .and_then(|entity| entity.get("isDeleted"))
            .is_some_and(|flag| flag.as_bool().unwrap_or_else(|| flag.as_i64().is_some_and(|n| n != 0)))
}

impl<T: Transport + 'static> GraphCache<T> {
    /// Applies a batch of server change notifications.
    ///
    /// After the batch, uncached parents of incoming branches and uncached
    /// targets of `template`/`inherit` relations are fetched, so every cached
    /// note keeps its ancestry. Subscribers receive
    /// [`CacheEvent::EntitiesReloaded`] unless nothing relevant changed.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::UnknownEntity`] for an unrecognized entity
    /// name and [`NotegraphError::Json`] for a malformed row; propagates
    /// transport failures.
    pub async fn apply_entity_changes(&mut self, changes: &[EntityChange]) -> Result<LoadResults> {
        let mut results = LoadResults::default();

        for change in changes {
            match change.entity_name.as_str() {
                "notes" => self.process_note_change(&mut results, change)?,
                "branches" => self.process_branch_change(&mut results, change).await?,
                "attributes" => self.process_attribute_change(&mut results, change)?,
                "note_reordering" => self.process_note_reordering(&mut results, change),
                "revisions" => results.add_revision(
                    &change.entity_id,
                    change.note_id.as_deref(),
                    change.component_id.as_deref(),
                ),
                "options" => self.process_option_change(&mut results, change)?,
                "attachments" => self.process_attachment_change(&mut results, change)?,
                "blobs" | "etapi_tokens" => {}
                other => return Err(NotegraphError::UnknownEntity(other.to_string())),
            }
        }

        let missing = self.missing_ancestry(changes);
        if !missing.is_empty() {
            log::debug!("Loading {} notes needed by incoming changes", missing.len());
            self.reload_notes(&missing).await?;
        }

        if !results.is_empty() {
            if results.has_attribute_related_changes() {
                self.graph().inheritance_cache().invalidate();
            }
            self.emit(CacheEvent::EntitiesReloaded(results.clone()));
        }

        Ok(results)
    }

    fn process_note_change(&mut self, results: &mut LoadResults, change: &EntityChange) -> Result<()> {
        let note_id = change.entity_id.as_str();
        // Notes never requested are outside the cached subset.
        let Some(current_blob_id) = self.graph().note(note_id).map(|note| note.blob_id.clone()) else {
            return Ok(());
        };
        results.add_note(note_id, change.component_id.as_deref());

        if change.is_erased {
            log::warn!("Note '{note_id}' was erased while cached; a full reload is required");
            results.require_full_reload();
            return Ok(());
        }
        if is_removed(change) {
            self.graph_mut().remove_note(note_id);
            return Ok(());
        }

        let Some(row) = entity_row::<NoteRow>(change)? else {
            return Ok(());
        };
        if row.blob_id != current_blob_id {
            self.blobs().invalidate_matching(note_id);
            results.add_note_content(note_id, change.component_id.as_deref());
        }
        self.graph_mut().update_note(row);
        Ok(())
    }

    async fn process_branch_change(&mut self, results: &mut LoadResults, change: &EntityChange) -> Result<()> {
        let branch_id = change.entity_id.as_str();
        let cached = self.graph().branch(branch_id, true).is_some();

        if change.is_erased && cached {
            log::warn!("Branch '{branch_id}' was erased while cached; a full reload is required");
            results.require_full_reload();
            return Ok(());
        }
        if is_removed(change) {
            if self.graph_mut().remove_branch(branch_id).is_some() {
                results.add_branch(branch_id, change.component_id.as_deref());
            }
            return Ok(());
        }

        let Some(row) = entity_row::<BranchRow>(change)? else {
            return Ok(());
        };
        results.add_branch(branch_id, change.component_id.as_deref());

        let child_cached = self.graph().note_exists(&row.note_id);
        let mut parent_cached = self.graph().note_exists(&row.parent_note_id);
        // A cached note must keep its ancestry.
        if child_cached && row.note_id != ROOT_NOTE_ID && !parent_cached {
            parent_cached = self.get_note(&row.parent_note_id, true).await?.is_some();
        }

        if cached || child_cached || parent_cached {
            self.graph_mut().add_response(SubtreeResponse {
                branches: vec![row],
                ..Default::default()
            });
        }
        Ok(())
    }

    fn process_attribute_change(&mut self, results: &mut LoadResults, change: &EntityChange) -> Result<()> {
        let attribute_id = change.entity_id.as_str();
        let cached = self.graph().attribute(attribute_id).is_some();

        if change.is_erased && cached {
            log::warn!("Attribute '{attribute_id}' was erased while cached; a full reload is required");
            results.require_full_reload();
            return Ok(());
        }
        if is_removed(change) {
            if self.graph_mut().remove_attribute(attribute_id).is_some() {
                results.add_attribute(attribute_id, change.component_id.as_deref());
            }
            return Ok(());
        }

        let Some(row) = entity_row::<AttributeRow>(change)? else {
            return Ok(());
        };
        results.add_attribute(attribute_id, change.component_id.as_deref());

        let owner_cached = self.graph().note_exists(&row.note_id);
        let target_cached =
            row.attribute_type == AttributeType::Relation && self.graph().note_exists(&row.value);
        if cached || owner_cached || target_cached {
            self.graph_mut().add_response(SubtreeResponse {
                attributes: vec![row],
                ..Default::default()
            });
        }
        Ok(())
    }

    fn process_note_reordering(&mut self, results: &mut LoadResults, change: &EntityChange) {
        if let Some(positions) = &change.positions {
            self.graph_mut().reorder_branches(positions);
        }
        results.add_note_reordering(&change.entity_id, change.component_id.as_deref());
    }

    fn process_option_change(&mut self, results: &mut LoadResults, change: &EntityChange) -> Result<()> {
        let Some(option) = entity_row::<OptionRow>(change)? else {
            return Ok(());
        };
        if IGNORED_OPTIONS.contains(&option.name.as_str()) {
            return Ok(());
        }
        results.add_option(&option.name);
        self.set_option(option.name, option.value);
        Ok(())
    }

    fn process_attachment_change(&mut self, results: &mut LoadResults, change: &EntityChange) -> Result<()> {
        let attachment_id = change.entity_id.as_str();
        let cached = self.graph().attachment(attachment_id).is_some();

        if change.is_erased && cached {
            log::warn!("Attachment '{attachment_id}' was erased while cached; a full reload is required");
            results.require_full_reload();
            return Ok(());
        }

        let row = entity_row::<AttachmentRow>(change)?;
        if is_removed(change) {
            if self.graph_mut().remove_attachment(attachment_id).is_some() {
                if let Some(row) = row {
                    results.add_attachment_row(row);
                }
            }
            return Ok(());
        }

        if let Some(row) = row {
            self.graph_mut().upsert_attachment(row.clone());
            results.add_attachment_row(row);
        }
        Ok(())
    }

    /// Uncached notes the batch refers to as branch parents or inheritance sources.
    fn missing_ancestry(&self, changes: &[EntityChange]) -> Vec<String> {
        let mut wanted = Vec::new();
        for change in changes.iter().filter(|c| !is_removed(c)) {
            match change.entity_name.as_str() {
                "branches" => {
                    if let Ok(Some(row)) = entity_row::<BranchRow>(change) {
                        wanted.push(row.parent_note_id);
                    }
                }
                "attributes" => {
                    if let Ok(Some(row)) = entity_row::<AttributeRow>(change) {
                        if row.attribute_type == AttributeType::Relation
                            && (row.name == "template" || row.name == "inherit")
                        {
                            wanted.push(row.value);
                        }
                    }
                }
                _ => {}
            }
        }
        self.graph().missing_parents(wanted.iter().map(String::as_str))
    }
}
