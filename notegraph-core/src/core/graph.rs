//! The in-memory note graph and its reconciliation primitive.
//!
//! [`Graph`] owns every cached note, branch, attribute and attachment. Reads
//! are public; all mutation is crate-private and funnels through
//! [`Graph::add_response`] or the narrow edit helpers used by the entity
//! updater. Every mutation clears the inheritance memo.

use crate::core::branch::VIRTUAL_BRANCH_PREFIX;
use crate::core::note::{NONE_NOTE_ID, ROOT_BRANCH_ID, ROOT_NOTE_ID};
use crate::{
    Attachment, AttachmentRow, Attribute, AttributeInheritanceCache, Branch, Note, NoteRef,
    NoteRow, NotegraphError, Result, SubtreeResponse,
};
use std::collections::{BTreeSet, HashMap};

/// Partial mirror of the server's note graph.
#[derive(Debug, Default)]
pub struct Graph {
    notes: HashMap<String, Note>,
    branches: HashMap<String, Branch>,
    attributes: HashMap<String, Attribute>,
    attachments: HashMap<String, Attachment>,
    inheritance: AttributeInheritanceCache,
    protected_session_available: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn note(&self, note_id: &str) -> Option<NoteRef<'_>> {
        self.notes.get(note_id).map(|note| NoteRef::new(self, note))
    }

    /// Like [`Graph::note`], but a missing note is an error.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::NoteNotFound`] if the note is not cached.
    pub fn require_note(&self, note_id: &str) -> Result<NoteRef<'_>> {
        self.note(note_id)
            .ok_or_else(|| NotegraphError::NoteNotFound(note_id.to_string()))
    }

    pub fn note_exists(&self, note_id: &str) -> bool {
        self.notes.contains_key(note_id)
    }

    /// Cached notes for `note_ids`, in request order. Missing IDs are skipped
    /// and, unless `silent`, logged.
    pub fn notes_from_cache<S: AsRef<str>>(&self, note_ids: &[S], silent: bool) -> Vec<NoteRef<'_>> {
        note_ids
            .iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let note = self.note(id);
                if note.is_none() && !silent {
                    log::trace!("Note '{id}' is not in the cache");
                }
                note
            })
            .collect()
    }

    pub fn note_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.notes.keys().map(String::as_str)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn branch(&self, branch_id: &str, silent: bool) -> Option<&Branch> {
        let branch = self.branches.get(branch_id);
        if branch.is_none() && !silent {
            log::warn!("Branch '{branch_id}' is not in the cache");
        }
        branch
    }

    /// # Errors
    ///
    /// Returns [`NotegraphError::BranchNotFound`] if the branch is not cached.
    pub fn require_branch(&self, branch_id: &str) -> Result<&Branch> {
        self.branches
            .get(branch_id)
            .ok_or_else(|| NotegraphError::BranchNotFound(branch_id.to_string()))
    }

    pub fn branches<S: AsRef<str>>(&self, branch_ids: &[S], silent: bool) -> Vec<&Branch> {
        branch_ids
            .iter()
            .filter_map(|id| self.branch(id.as_ref(), silent))
            .collect()
    }

    /// ID of the branch placing `child_note_id` under `parent_note_id`.
    /// The root sits under the pseudo branch `none_root`.
    pub fn branch_id(&self, parent_note_id: &str, child_note_id: &str) -> Option<&str> {
        if child_note_id == ROOT_NOTE_ID {
            return Some(ROOT_BRANCH_ID);
        }
        let child = self.notes.get(child_note_id)?;
        match child.parent_to_branch.get(parent_note_id) {
            Some(branch_id) => Some(branch_id.as_str()),
            None => {
                log::debug!("No branch between parent '{parent_note_id}' and child '{child_note_id}'");
                None
            }
        }
    }

    pub fn attribute(&self, attribute_id: &str) -> Option<&Attribute> {
        self.attributes.get(attribute_id)
    }

    pub fn attachment(&self, attachment_id: &str) -> Option<&Attachment> {
        self.attachments.get(attachment_id)
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn inheritance_cache(&self) -> &AttributeInheritanceCache {
        &self.inheritance
    }

    pub fn is_protected_session_available(&self) -> bool {
        self.protected_session_available
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub(crate) fn set_protected_session_available(&mut self, available: bool) {
        self.protected_session_available = available;
    }

    /// Forgets every entity. The protected-session flag is kept.
    pub(crate) fn clear(&mut self) {
        self.notes.clear();
        self.branches.clear();
        self.attributes.clear();
        self.attachments.clear();
        self.inheritance.invalidate();
    }

    /// Merges one server response into the graph.
    ///
    /// Existing notes are updated in place and lose their real (non-search)
    /// edges, which the response then re-declares. Branches and attributes
    /// are applied afterwards, and every touched note is re-sorted once at
    /// the end, so no reader sees a half-wired note. Applying the same
    /// response twice leaves the graph unchanged.
    pub(crate) fn add_response(&mut self, response: SubtreeResponse) {
        let SubtreeResponse {
            notes,
            branches,
            attributes,
        } = response;
        let counts = (notes.len(), branches.len(), attributes.len());
        let mut touched = BTreeSet::new();

        for row in notes {
            self.apply_note_row(row, &mut touched);
        }

        for row in branches {
            let branch = Branch::from_row(row);
            if let Some(child) = self.notes.get_mut(&branch.note_id) {
                child.add_parent(&branch.parent_note_id, &branch.branch_id);
                touched.insert(branch.note_id.clone());
            }
            if let Some(parent) = self.notes.get_mut(&branch.parent_note_id) {
                parent.add_child(&branch.note_id, &branch.branch_id);
                touched.insert(branch.parent_note_id.clone());
            }
            self.branches.insert(branch.branch_id.clone(), branch);
        }

        for row in attributes {
            let attribute = Attribute::from_row(row);
            let previous_target = self
                .attributes
                .get(&attribute.attribute_id)
                .and_then(|previous| previous.target_note_id())
                .filter(|previous| Some(*previous) != attribute.target_note_id())
                .map(str::to_string);
            if let Some(stale) = previous_target.and_then(|id| self.notes.get_mut(&id)) {
                stale.target_relations.retain(|id| *id != attribute.attribute_id);
            }
            if let Some(owner) = self.notes.get_mut(&attribute.note_id) {
                if !owner.attributes.contains(&attribute.attribute_id) {
                    owner.attributes.push(attribute.attribute_id.clone());
                }
            }
            if let Some(target) = attribute
                .target_note_id()
                .and_then(|target_id| self.notes.get_mut(target_id))
            {
                if !target.target_relations.contains(&attribute.attribute_id) {
                    target.target_relations.push(attribute.attribute_id.clone());
                }
            }
            self.attributes.insert(attribute.attribute_id.clone(), attribute);
        }

        self.resort(&touched);

        log::debug!(
            "Reconciled {} notes, {} branches, {} attributes; re-sorted {} notes",
            counts.0,
            counts.1,
            counts.2,
            touched.len()
        );
    }

    fn apply_note_row(&mut self, row: NoteRow, touched: &mut BTreeSet<String>) {
        let note_id = row.note_id.clone();
        let Some(note) = self.notes.get_mut(&note_id) else {
            self.notes.insert(note_id, Note::new(row));
            return;
        };
        note.update(row);

        let children: Vec<(String, String)> = note
            .child_to_branch
            .iter()
            .map(|(child, branch)| (child.clone(), branch.clone()))
            .collect();
        let parents: Vec<(String, String)> = note
            .parent_to_branch
            .iter()
            .map(|(parent, branch)| (parent.clone(), branch.clone()))
            .collect();

        for (child_id, branch_id) in children {
            // Search results are never re-sent as tree edges.
            if self.branches.get(&branch_id).is_some_and(|b| b.from_search_note) {
                continue;
            }
            self.unlink(&note_id, &child_id);
            self.branches.remove(&branch_id);
            touched.insert(child_id);
            touched.insert(note_id.clone());
        }

        for (parent_id, branch_id) in parents {
            let keep = self.notes.contains_key(&parent_id)
                && self.branches.get(&branch_id).is_some_and(|b| b.from_search_note);
            if keep {
                continue;
            }
            self.unlink(&parent_id, &note_id);
            self.branches.remove(&branch_id);
            touched.insert(parent_id);
            touched.insert(note_id.clone());
        }
    }

    /// Removes the cross-links between a parent and a child. The branch entry itself is left alone.
    fn unlink(&mut self, parent_note_id: &str, child_note_id: &str) {
        if let Some(parent) = self.notes.get_mut(parent_note_id) {
            parent.remove_child(child_note_id);
        }
        if let Some(child) = self.notes.get_mut(child_note_id) {
            child.remove_parent(parent_note_id);
        }
    }

    fn resort(&mut self, note_ids: &BTreeSet<String>) {
        // Parent ranking reads `archived`, so stale resolutions must go first.
        self.inheritance.invalidate();
        for note_id in note_ids {
            self.sort_children(note_id);
        }
        for note_id in note_ids {
            self.sort_parents(note_id);
        }
        // Parent order feeds inherited attribute order.
        self.inheritance.invalidate();
    }

    /// Orders children by branch position; children without a known branch go last.
    pub(crate) fn sort_children(&mut self, note_id: &str) {
        let Some(note) = self.notes.get(note_id) else {
            return;
        };
        let mut keyed: Vec<(Option<i64>, String)> = note
            .children
            .iter()
            .map(|child_id| {
                let position = note
                    .child_to_branch
                    .get(child_id)
                    .and_then(|branch_id| self.branches.get(branch_id))
                    .map(|branch| branch.note_position);
                (position, child_id.clone())
            })
            .collect();
        keyed.sort_by(|(a_pos, a_id), (b_pos, b_id)| {
            a_pos
                .is_none()
                .cmp(&b_pos.is_none())
                .then(a_pos.cmp(b_pos))
                .then(a_id.cmp(b_id))
        });

        if let Some(note) = self.notes.get_mut(note_id) {
            note.children = keyed.into_iter().map(|(_, id)| id).collect();
        }
    }

    /// Orders parents so that real, visible, non-archived parents come first,
    /// each group by note ID.
    pub(crate) fn sort_parents(&mut self, note_id: &str) {
        let Some(note) = self.note(note_id) else {
            return;
        };
        let mut keyed: Vec<(bool, String)> = note
            .parents()
            .iter()
            .map(|parent_id| {
                let is_virtual = note.parent_to_branch().get(parent_id).is_some_and(|branch_id| {
                    branch_id.starts_with(VIRTUAL_BRANCH_PREFIX)
                        || self.branches.get(branch_id).is_some_and(|b| b.from_search_note)
                });
                let demoted = is_virtual
                    || self
                        .note(parent_id)
                        .map_or(true, |parent| parent.is_archived() || parent.is_hidden_completely());
                (demoted, parent_id.clone())
            })
            .collect();
        keyed.sort();

        if let Some(note) = self.notes.get_mut(note_id) {
            note.parents = keyed.into_iter().map(|(_, id)| id).collect();
        }
    }

    /// Drops a note and its cross-links. Its branches stay until they are deleted themselves.
    pub(crate) fn remove_note(&mut self, note_id: &str) -> Option<Note> {
        let note = self.notes.remove(note_id)?;
        for parent_id in &note.parents {
            if let Some(parent) = self.notes.get_mut(parent_id) {
                parent.remove_child(note_id);
            }
        }
        for child_id in &note.children {
            if let Some(child) = self.notes.get_mut(child_id) {
                child.remove_parent(note_id);
            }
        }
        self.inheritance.invalidate();
        Some(note)
    }

    /// Updates the scalar fields of a cached note. Returns false if the note is not cached.
    pub(crate) fn update_note(&mut self, row: NoteRow) -> bool {
        let Some(note) = self.notes.get_mut(&row.note_id) else {
            return false;
        };
        note.update(row);
        self.inheritance.invalidate();
        true
    }

    /// Deletes a branch and unlinks both of its endpoints.
    pub(crate) fn remove_branch(&mut self, branch_id: &str) -> Option<Branch> {
        let branch = self.branches.remove(branch_id)?;

        if let Some(child) = self.notes.get_mut(&branch.note_id) {
            if child.parent_to_branch.get(&branch.parent_note_id).is_some_and(|b| b == branch_id) {
                child.remove_parent(&branch.parent_note_id);
            }
        }
        if let Some(parent) = self.notes.get_mut(&branch.parent_note_id) {
            if parent.child_to_branch.get(&branch.note_id).is_some_and(|b| b == branch_id) {
                parent.remove_child(&branch.note_id);
            }
        }
        self.inheritance.invalidate();
        Some(branch)
    }

    /// Drops every saved-search result edge below `search_note_id`.
    pub(crate) fn clear_virtual_children(&mut self, search_note_id: &str) {
        let Some(note) = self.notes.get(search_note_id) else {
            return;
        };
        let virtual_branch_ids: Vec<String> = note
            .child_to_branch
            .values()
            .filter(|branch_id| self.branches.get(*branch_id).map_or(true, Branch::is_virtual))
            .cloned()
            .collect();

        for branch_id in &virtual_branch_ids {
            if self.branches.contains_key(branch_id) {
                self.remove_branch(branch_id);
            }
        }
        if let Some(note) = self.notes.get_mut(search_note_id) {
            let removed: Vec<String> = note
                .child_to_branch
                .iter()
                .filter(|(_, branch_id)| virtual_branch_ids.contains(branch_id))
                .map(|(child_id, _)| child_id.clone())
                .collect();
            for child_id in removed {
                note.remove_child(&child_id);
            }
        }
        log::trace!(
            "Cleared {} saved-search results below '{search_note_id}'",
            virtual_branch_ids.len()
        );
    }

    pub(crate) fn set_search_results(&mut self, search_note_id: &str, highlighted_tokens: Vec<String>) {
        if let Some(note) = self.notes.get_mut(search_note_id) {
            note.search_results_loaded = true;
            note.highlighted_tokens = highlighted_tokens;
        }
    }

    /// Removes an attribute from its owner and from its relation target.
    pub(crate) fn remove_attribute(&mut self, attribute_id: &str) -> Option<Attribute> {
        let attribute = self.attributes.remove(attribute_id)?;
        if let Some(owner) = self.notes.get_mut(&attribute.note_id) {
            owner.attributes.retain(|id| id != attribute_id);
        }
        if let Some(target) = attribute
            .target_note_id()
            .and_then(|target_id| self.notes.get_mut(target_id))
        {
            target.target_relations.retain(|id| id != attribute_id);
        }
        self.inheritance.invalidate();
        Some(attribute)
    }

    /// Applies new branch positions and re-sorts the affected parents.
    /// Returns the parents whose children were re-sorted.
    pub(crate) fn reorder_branches(&mut self, positions: &HashMap<String, i64>) -> Vec<String> {
        let mut parents = BTreeSet::new();
        for (branch_id, position) in positions {
            if let Some(branch) = self.branches.get_mut(branch_id) {
                branch.note_position = *position;
                parents.insert(branch.parent_note_id.clone());
            }
        }
        for parent_id in &parents {
            self.sort_children(parent_id);
        }
        parents.into_iter().collect()
    }

    /// Records a note's complete attachment list.
    pub(crate) fn set_note_attachments(&mut self, note_id: &str, rows: Vec<AttachmentRow>) -> Vec<String> {
        let ids: Vec<String> = rows.iter().map(|row| row.attachment_id.clone()).collect();
        for row in rows {
            let attachment = Attachment::from_row(row);
            self.attachments
                .insert(attachment.attachment_id.clone(), attachment);
        }
        if let Some(note) = self.notes.get_mut(note_id) {
            note.attachments = Some(ids.clone());
        }
        ids
    }

    /// Creates or refreshes an attachment.
    ///
    /// A new attachment is only tracked when its owner's list has been loaded,
    /// otherwise the next list load would pick it up anyway. Returns whether
    /// anything was stored.
    pub(crate) fn upsert_attachment(&mut self, row: AttachmentRow) -> bool {
        if let Some(existing) = self.attachments.get_mut(&row.attachment_id) {
            existing.update(row);
            return true;
        }
        let Some(owner_list) = self
            .notes
            .get_mut(&row.owner_id)
            .and_then(|owner| owner.attachments.as_mut())
        else {
            return false;
        };
        owner_list.push(row.attachment_id.clone());
        self.attachments
            .insert(row.attachment_id.clone(), Attachment::from_row(row));
        true
    }

    pub(crate) fn remove_attachment(&mut self, attachment_id: &str) -> Option<Attachment> {
        let attachment = self.attachments.remove(attachment_id)?;
        if let Some(list) = self
            .notes
            .get_mut(&attachment.owner_id)
            .and_then(|owner| owner.attachments.as_mut())
        {
            list.retain(|id| id != attachment_id);
        }
        Some(attachment)
    }

    /// Parent note IDs named by `branches` that are not cached.
    pub(crate) fn missing_parents<'a>(&self, parent_note_ids: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = parent_note_ids
            .filter(|id| *id != NONE_NOTE_ID && !self.notes.contains_key(*id))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}
