//! Notes (graph vertices) and their read API.
//!
//! A [`Note`] only stores its own row plus edge and attribute IDs. Anything
//! that needs the rest of the graph (effective attributes, parents, paths)
//! goes through [`NoteRef`], a borrowed view pairing a note with the
//! [`Graph`] it lives in.

use crate::core::attribute::validate_attribute_name;
use crate::{Attribute, AttributeType, Branch, Graph, NoteRow, NoteType, Result};
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::sync::Arc;

/// ID of the graph root.
pub const ROOT_NOTE_ID: &str = "root";
/// ID of the root of the hidden (system) subtree.
pub const HIDDEN_ROOT_ID: &str = "_hidden";
/// ID of the root of the shared subtree.
pub const SHARE_ROOT_ID: &str = "_share";
/// Pseudo parent of the root note.
pub const NONE_NOTE_ID: &str = "none";
/// Pseudo branch placing the root under [`NONE_NOTE_ID`].
pub const ROOT_BRANCH_ID: &str = "none_root";

/// Labels marking a note as a template; they describe the template itself and are not inherited.
const TEMPLATE_MARKER_LABELS: [&str; 2] = ["template", "workspacetemplate"];

/// A cached note.
///
/// Notes are created the first time a server response mentions them and are
/// then updated in place, so a note ID handed out once keeps resolving to the
/// same entry. Edge lists are kept in sync with their lookup maps by [`Graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub note_id: String,
    pub title: String,
    pub is_protected: bool,
    pub note_type: NoteType,
    /// Content type, e.g. `application/json`.
    pub mime: String,
    /// Content version token; equal IDs mean identical content.
    pub blob_id: String,

    pub(crate) attributes: Vec<String>,
    pub(crate) target_relations: Vec<String>,
    pub(crate) parents: Vec<String>,
    pub(crate) children: Vec<String>,
    pub(crate) parent_to_branch: HashMap<String, String>,
    pub(crate) child_to_branch: HashMap<String, String>,
    pub(crate) attachments: Option<Vec<String>>,
    pub(crate) search_results_loaded: bool,
    pub(crate) highlighted_tokens: Vec<String>,
}

impl Note {
    pub(crate) fn new(row: NoteRow) -> Self {
        let mut note = Self {
            note_id: String::new(),
            title: String::new(),
            is_protected: false,
            note_type: row.note_type,
            mime: String::new(),
            blob_id: String::new(),
            attributes: Vec::new(),
            target_relations: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            parent_to_branch: HashMap::new(),
            child_to_branch: HashMap::new(),
            attachments: None,
            search_results_loaded: false,
            highlighted_tokens: Vec::new(),
        };
        note.update(row);
        note
    }

    pub(crate) fn update(&mut self, row: NoteRow) {
        self.note_id = row.note_id;
        self.title = row.title;
        self.is_protected = row.is_protected;
        self.note_type = row.note_type;
        self.mime = row.mime;
        self.blob_id = row.blob_id;
    }

    pub fn to_row(&self) -> NoteRow {
        NoteRow {
            note_id: self.note_id.clone(),
            title: self.title.clone(),
            is_protected: self.is_protected,
            note_type: self.note_type,
            mime: self.mime.clone(),
            blob_id: self.blob_id.clone(),
        }
    }

    pub(crate) fn add_parent(&mut self, parent_note_id: &str, branch_id: &str) {
        if parent_note_id == NONE_NOTE_ID {
            return;
        }
        if !self.parent_to_branch.contains_key(parent_note_id) {
            self.parents.push(parent_note_id.to_string());
        }
        self.parent_to_branch
            .insert(parent_note_id.to_string(), branch_id.to_string());
    }

    pub(crate) fn add_child(&mut self, child_note_id: &str, branch_id: &str) {
        if !self.child_to_branch.contains_key(child_note_id) {
            self.children.push(child_note_id.to_string());
        }
        self.child_to_branch
            .insert(child_note_id.to_string(), branch_id.to_string());
    }

    /// Unlinks a parent, returning the branch ID that connected them.
    pub(crate) fn remove_parent(&mut self, parent_note_id: &str) -> Option<String> {
        self.parents.retain(|p| p != parent_note_id);
        self.parent_to_branch.remove(parent_note_id)
    }

    /// Unlinks a child, returning the branch ID that connected them.
    pub(crate) fn remove_child(&mut self, child_note_id: &str) -> Option<String> {
        self.children.retain(|c| c != child_note_id);
        self.child_to_branch.remove(child_note_id)
    }

    /// Parent note IDs, best-ranked parent first.
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Child note IDs in ascending branch position.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn parent_to_branch(&self) -> &HashMap<String, String> {
        &self.parent_to_branch
    }

    pub fn child_to_branch(&self) -> &HashMap<String, String> {
        &self.child_to_branch
    }

    /// IDs of the attributes this note owns.
    pub fn attribute_ids(&self) -> &[String] {
        &self.attributes
    }

    /// IDs of relations (owned by other notes) pointing at this note.
    pub fn target_relation_ids(&self) -> &[String] {
        &self.target_relations
    }

    /// IDs of this note's attachments, or `None` while they have not been loaded.
    pub fn attachment_ids(&self) -> Option<&[String]> {
        self.attachments.as_deref()
    }

    pub fn search_results_loaded(&self) -> bool {
        self.search_results_loaded
    }

    /// Tokens the last saved-search evaluation asked to highlight.
    pub fn highlighted_tokens(&self) -> &[String] {
        &self.highlighted_tokens
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.note_id == ROOT_NOTE_ID
    }

    pub fn is_json(&self) -> bool {
        self.mime == "application/json"
    }

    /// True for JavaScript held in a code, file or launcher note.
    pub fn is_javascript(&self) -> bool {
        self.note_type.can_hold_script()
            && (self.mime.starts_with("application/javascript")
                || self.mime == "application/x-javascript"
                || self.mime == "text/javascript")
    }

    pub fn is_jsx(&self) -> bool {
        self.note_type == NoteType::Code && self.mime == "text/jsx"
    }

    pub fn is_html(&self) -> bool {
        self.note_type.can_hold_html() && self.mime == "text/html"
    }

    /// Where a script note is meant to run, or `None` if it is not runnable.
    pub fn script_env(&self) -> Option<ScriptEnv> {
        if self.is_html()
            || (self.is_javascript() && self.mime.ends_with("env=frontend"))
            || self.is_jsx()
            || self.note_type == NoteType::Render
        {
            Some(ScriptEnv::Frontend)
        } else if self.is_javascript() && self.mime.ends_with("env=backend") {
            Some(ScriptEnv::Backend)
        } else {
            None
        }
    }

    /// True for notes inside the options subtree.
    pub fn is_options(&self) -> bool {
        self.note_id.starts_with("_options")
    }
}

/// Execution environment of a script note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptEnv {
    Frontend,
    Backend,
}

/// A note together with the graph it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct NoteRef<'g> {
    graph: &'g Graph,
    note: &'g Note,
}

impl<'g> Deref for NoteRef<'g> {
    type Target = Note;

    fn deref(&self) -> &Note {
        self.note
    }
}

impl PartialEq for NoteRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.note.note_id == other.note.note_id
    }
}

impl<'g> NoteRef<'g> {
    pub(crate) fn new(graph: &'g Graph, note: &'g Note) -> Self {
        Self { graph, note }
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn note(&self) -> &'g Note {
        self.note
    }

    /// Branch IDs connecting this note to its parents, in parent order.
    pub fn parent_branch_ids(&self) -> Vec<&'g str> {
        self.note
            .parents
            .iter()
            .filter_map(|p| self.note.parent_to_branch.get(p).map(String::as_str))
            .collect()
    }

    pub fn parent_branches(&self) -> Vec<&'g Branch> {
        self.graph.branches(&self.parent_branch_ids(), false)
    }

    /// Branches to the children, in child order.
    pub fn child_branches(&self) -> Vec<&'g Branch> {
        let ids: Vec<&str> = self
            .note
            .children
            .iter()
            .filter_map(|c| self.note.child_to_branch.get(c).map(String::as_str))
            .collect();
        self.graph.branches(&ids, false)
    }

    pub fn parent_notes(&self) -> Vec<NoteRef<'g>> {
        self.graph.notes_from_cache(&self.note.parents, false)
    }

    /// Children currently in the cache; use
    /// [`GraphCache::get_notes`](crate::GraphCache::get_notes) to load the rest.
    pub fn cached_child_notes(&self) -> Vec<NoteRef<'g>> {
        self.graph.notes_from_cache(&self.note.children, true)
    }

    // ------------------------------------------------------------------
    // Attribute resolution
    // ------------------------------------------------------------------

    fn owned_attribute_list(&self) -> impl Iterator<Item = &'g Attribute> + 'g {
        let graph = self.graph;
        let note = self.note;
        note.attributes.iter().filter_map(move |id| graph.attribute(id))
    }

    /// All attributes applying to this note: owned, then inherited from
    /// ancestors, then transferred from `template`/`inherit` targets.
    fn effective_attribute_list(&self) -> Vec<&'g Attribute> {
        let (ids, _) = self.resolve_attribute_ids(&[]);
        ids.iter().filter_map(|id| self.graph.attribute(id)).collect()
    }

    /// Resolves the effective attribute IDs of this note.
    ///
    /// `path` holds the notes on the current recursion chain; reaching a note
    /// already on it means a template cycle and contributes nothing. Also
    /// returns the shallowest path depth at which such a cut happened below.
    ///
    /// A result is memoized only if no cut reached above this note: a list
    /// truncated for the sake of an outer caller is not this note's answer.
    fn resolve_attribute_ids(&self, path: &[&str]) -> (Arc<[String]>, Option<usize>) {
        let note_id = self.note.note_id.as_str();

        if let Some(depth) = path.iter().position(|id| *id == note_id) {
            log::trace!("Attribute inheritance of '{note_id}' cycles back through {path:?}");
            return (Arc::from(Vec::new()), Some(depth));
        }

        if let Some(resolved) = self.graph.inheritance_cache().get(note_id) {
            return (resolved, None);
        }

        let mut cut: Option<usize> = None;

        let mut new_path = path.to_vec();
        new_path.push(note_id);

        let mut collected: Vec<String> = self
            .owned_attribute_list()
            .map(|attr| attr.attribute_id.clone())
            .collect();

        // Inheritable attributes of the root are not meant for the hidden subtree.
        if note_id != ROOT_NOTE_ID && note_id != HIDDEN_ROOT_ID {
            for parent in self.parent_notes() {
                // Saved-search membership is not ancestry.
                if parent.note_type != NoteType::Search {
                    let (inherited, depth) = parent.inheritable_attribute_ids(&new_path);
                    cut = shallowest_cut(cut, depth);
                    collected.extend(inherited);
                }
            }
        }

        let template_ids: Vec<&'g str> = collected
            .iter()
            .filter_map(|id| self.graph.attribute(id))
            .filter(|attr| attr.is_inheritance_relation())
            .map(|attr| attr.value.as_str())
            .collect();

        for template_id in template_ids {
            let Some(template) = self.graph.note(template_id) else {
                continue;
            };
            if template.note_id == note_id {
                continue;
            }
            let (transferred, depth) = template.resolve_attribute_ids(&new_path);
            cut = shallowest_cut(cut, depth);
            collected.extend(
                transferred
                    .iter()
                    .filter(|id| {
                        !self
                            .graph
                            .attribute(id)
                            .is_some_and(|attr| attr.is_label() && TEMPLATE_MARKER_LABELS.contains(&attr.name.as_str()))
                    })
                    .cloned(),
            );
        }

        let mut seen = HashSet::new();
        let resolved: Arc<[String]> = collected
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if cut.map_or(true, |depth| depth >= path.len()) {
            self.graph.inheritance_cache().insert(note_id, Arc::clone(&resolved));
        }
        (resolved, cut)
    }

    fn inheritable_attribute_ids(&self, path: &[&str]) -> (Vec<String>, Option<usize>) {
        let (resolved, cut) = self.resolve_attribute_ids(path);
        let inheritable = resolved
            .iter()
            .filter(|id| self.graph.attribute(id).is_some_and(|attr| attr.is_inheritable))
            .cloned()
            .collect();
        (inheritable, cut)
    }

    /// First effective attribute with the given type and name, without validating the name.
    fn find_effective(&self, attribute_type: AttributeType, name: &str) -> Option<&'g Attribute> {
        self.effective_attribute_list()
            .into_iter()
            .find(|attr| attr.attribute_type == attribute_type && attr.name == name)
    }

    // ------------------------------------------------------------------
    // Attribute queries
    // ------------------------------------------------------------------

    /// Attributes owned by this note, optionally filtered. Never consults the inheritance memo.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotegraphError::MalformedQuery`] if `name` starts with `#` or `~`.
    pub fn owned_attributes(
        &self,
        attribute_type: Option<AttributeType>,
        name: Option<&str>,
    ) -> Result<Vec<&'g Attribute>> {
        filter_attributes(self.owned_attribute_list(), attribute_type, name)
    }

    /// Effective attributes (owned and inherited), optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotegraphError::MalformedQuery`] if `name` starts with `#` or `~`.
    pub fn attributes(
        &self,
        attribute_type: Option<AttributeType>,
        name: Option<&str>,
    ) -> Result<Vec<&'g Attribute>> {
        if let Some(name) = name {
            validate_attribute_name(name)?;
        }
        filter_attributes(self.effective_attribute_list().into_iter(), attribute_type, name)
    }

    pub fn owned_labels(&self, name: Option<&str>) -> Result<Vec<&'g Attribute>> {
        self.owned_attributes(Some(AttributeType::Label), name)
    }

    pub fn labels(&self, name: Option<&str>) -> Result<Vec<&'g Attribute>> {
        self.attributes(Some(AttributeType::Label), name)
    }

    pub fn owned_relations(&self, name: Option<&str>) -> Result<Vec<&'g Attribute>> {
        self.owned_attributes(Some(AttributeType::Relation), name)
    }

    pub fn relations(&self, name: Option<&str>) -> Result<Vec<&'g Attribute>> {
        self.attributes(Some(AttributeType::Relation), name)
    }

    /// First owned attribute of the given type and name.
    pub fn owned_attribute(&self, attribute_type: AttributeType, name: &str) -> Result<Option<&'g Attribute>> {
        Ok(self.owned_attributes(Some(attribute_type), Some(name))?.into_iter().next())
    }

    /// First effective attribute of the given type and name; owned attributes win over inherited ones.
    pub fn attribute(&self, attribute_type: AttributeType, name: &str) -> Result<Option<&'g Attribute>> {
        validate_attribute_name(name)?;
        Ok(self.find_effective(attribute_type, name))
    }

    pub fn has_owned_attribute(&self, attribute_type: AttributeType, name: &str) -> Result<bool> {
        Ok(self.owned_attribute(attribute_type, name)?.is_some())
    }

    pub fn has_attribute(&self, attribute_type: AttributeType, name: &str) -> Result<bool> {
        Ok(self.attribute(attribute_type, name)?.is_some())
    }

    pub fn owned_attribute_value(&self, attribute_type: AttributeType, name: &str) -> Result<Option<&'g str>> {
        Ok(self.owned_attribute(attribute_type, name)?.map(|attr| attr.value.as_str()))
    }

    pub fn attribute_value(&self, attribute_type: AttributeType, name: &str) -> Result<Option<&'g str>> {
        Ok(self.attribute(attribute_type, name)?.map(|attr| attr.value.as_str()))
    }

    pub fn has_owned_label(&self, name: &str) -> Result<bool> {
        self.has_owned_attribute(AttributeType::Label, name)
    }

    pub fn has_label(&self, name: &str) -> Result<bool> {
        self.has_attribute(AttributeType::Label, name)
    }

    pub fn has_owned_relation(&self, name: &str) -> Result<bool> {
        self.has_owned_attribute(AttributeType::Relation, name)
    }

    pub fn has_relation(&self, name: &str) -> Result<bool> {
        self.has_attribute(AttributeType::Relation, name)
    }

    pub fn owned_label(&self, name: &str) -> Result<Option<&'g Attribute>> {
        self.owned_attribute(AttributeType::Label, name)
    }

    pub fn label(&self, name: &str) -> Result<Option<&'g Attribute>> {
        self.attribute(AttributeType::Label, name)
    }

    pub fn owned_relation(&self, name: &str) -> Result<Option<&'g Attribute>> {
        self.owned_attribute(AttributeType::Relation, name)
    }

    pub fn relation(&self, name: &str) -> Result<Option<&'g Attribute>> {
        self.attribute(AttributeType::Relation, name)
    }

    pub fn owned_label_value(&self, name: &str) -> Result<Option<&'g str>> {
        self.owned_attribute_value(AttributeType::Label, name)
    }

    pub fn label_value(&self, name: &str) -> Result<Option<&'g str>> {
        self.attribute_value(AttributeType::Label, name)
    }

    pub fn owned_relation_value(&self, name: &str) -> Result<Option<&'g str>> {
        self.owned_attribute_value(AttributeType::Relation, name)
    }

    pub fn relation_value(&self, name: &str) -> Result<Option<&'g str>> {
        self.attribute_value(AttributeType::Relation, name)
    }

    /// True if the label exists (owned or inherited) and its value is not `"false"`.
    pub fn is_label_truthy(&self, name: &str) -> Result<bool> {
        Ok(self.label(name)?.is_some_and(|label| label.value != "false"))
    }

    /// Value lookup by wire notation: `#name` for labels, `~name` for relations,
    /// a bare name for labels.
    pub fn label_or_relation(&self, name_with_prefix: &str) -> Result<Option<&'g str>> {
        if let Some(name) = name_with_prefix.strip_prefix('#') {
            self.label_value(name)
        } else if let Some(name) = name_with_prefix.strip_prefix('~') {
            self.relation_value(name)
        } else {
            self.label_value(name_with_prefix)
        }
    }

    /// True if the note carries the `archived` label, owned or inherited.
    pub fn is_archived(&self) -> bool {
        self.find_effective(AttributeType::Label, "archived").is_some()
    }

    /// Cached targets of this note's `template` and `inherit` relations.
    pub fn notes_to_inherit_from(&self) -> Vec<NoteRef<'g>> {
        self.effective_attribute_list()
            .into_iter()
            .filter(|attr| attr.is_inheritance_relation())
            .filter_map(|attr| self.graph.note(&attr.value))
            .collect()
    }

    /// Relations owned by other notes that point at this note.
    pub fn target_relations(&self) -> Vec<&'g Attribute> {
        self.note
            .target_relations
            .iter()
            .filter_map(|id| self.graph.attribute(id))
            .collect()
    }

    /// Cached owners of the relations pointing at this note, without duplicates.
    pub fn target_relation_source_notes(&self) -> Vec<NoteRef<'g>> {
        let mut seen = HashSet::new();
        let owners: Vec<&'g str> = self
            .target_relations()
            .into_iter()
            .map(|rel| rel.note_id.as_str())
            .filter(|owner| seen.insert(*owner))
            .collect();
        self.graph.notes_from_cache(&owners, true)
    }

    /// Cached targets of the effective relations, optionally filtered by name.
    pub fn relation_targets(&self, name: Option<&str>) -> Result<Vec<NoteRef<'g>>> {
        Ok(self
            .relations(name)?
            .into_iter()
            .filter_map(|rel| rel.target_note_id())
            .filter_map(|target| self.graph.note(target))
            .collect())
    }

    /// Cached target of the first effective relation named `name`.
    pub fn relation_target(&self, name: &str) -> Result<Option<NoteRef<'g>>> {
        Ok(self.relation_targets(Some(name))?.into_iter().next())
    }

    /// Effective `label:*` / `relation:*` definition labels.
    pub fn attribute_definitions(&self) -> Vec<&'g Attribute> {
        self.effective_attribute_list()
            .into_iter()
            .filter(|attr| attr.is_definition())
            .collect()
    }

    /// Promoted definitions, grouped by owning note and ordered by position within each owner.
    pub fn promoted_definition_attributes(&self) -> Vec<&'g Attribute> {
        if self
            .find_effective(AttributeType::Label, "hidePromotedAttributes")
            .is_some_and(|label| label.value != "false")
        {
            return Vec::new();
        }

        let mut promoted: Vec<&'g Attribute> = self
            .attribute_definitions()
            .into_iter()
            .filter(|attr| attr.definition().is_some_and(|def| def.is_promoted))
            .collect();
        promoted.sort_by(|a, b| a.note_id.cmp(&b.note_id).then(a.position.cmp(&b.position)));
        promoted
    }

    // ------------------------------------------------------------------
    // Presentation helpers
    // ------------------------------------------------------------------

    /// Space-joined values of all `cssClass` labels.
    pub fn css_class(&self) -> String {
        self.effective_attribute_list()
            .into_iter()
            .filter(|attr| attr.is_label() && attr.name == "cssClass")
            .map(|attr| attr.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn workspace_icon_class(&self) -> Option<&'g str> {
        self.find_effective(AttributeType::Label, "workspaceIconClass")
            .map(|label| label.value.as_str())
    }

    pub fn workspace_tab_background_color(&self) -> Option<&'g str> {
        self.find_effective(AttributeType::Label, "workspaceTabBackgroundColor")
            .map(|label| label.value.as_str())
    }

    /// Full icon class for the tree, honoring `iconClass` and `workspaceIconClass` labels.
    pub fn icon_class(&self) -> String {
        let icon = if let Some(label) = self.find_effective(AttributeType::Label, "iconClass") {
            label.value.as_str()
        } else if let Some(workspace_icon) = self.workspace_icon_class().filter(|v| !v.is_empty()) {
            workspace_icon
        } else if self.note.is_root() {
            "bx bx-home-alt-2"
        } else if self.note.note_id == SHARE_ROOT_ID {
            "bx bx-share-alt"
        } else {
            match self.note.note_type {
                NoteType::Text if self.is_folder() => "bx bx-folder",
                other => other.default_icon(),
            }
        };
        format!("tn-icon {icon}")
    }

    /// Saved searches and notes with children render as folders.
    ///
    /// Archived children still count: filtering them would require loading them.
    pub fn is_folder(&self) -> bool {
        self.note.note_type == NoteType::Search || !self.child_branches().is_empty()
    }

    /// False for protected notes while no protected session is open.
    pub fn is_content_available(&self) -> bool {
        !self.note.is_protected || self.graph.is_protected_session_available()
    }

    /// True for an image note that is only used inline by its single text parent.
    pub fn is_eligible_for_conversion_to_attachment(&self) -> bool {
        if self.note.note_type != NoteType::Image
            || !self.is_content_available()
            || self.note.has_children()
            || self.parent_branches().len() != 1
        {
            return false;
        }

        let image_links: Vec<&Attribute> = self
            .target_relations()
            .into_iter()
            .filter(|rel| rel.name == "imageLink")
            .collect();
        if image_links.len() > 1 {
            return false;
        }

        let Some(parent) = self.parent_notes().into_iter().next() else {
            return false;
        };
        if let Some(link) = image_links.first() {
            if link.note_id != parent.note_id {
                return false;
            }
        }

        parent.note_type == NoteType::Text && parent.is_content_available()
    }
}

fn shallowest_cut(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn filter_attributes<'a>(
    attributes: impl Iterator<Item = &'a Attribute>,
    attribute_type: Option<AttributeType>,
    name: Option<&str>,
) -> Result<Vec<&'a Attribute>> {
    if let Some(name) = name {
        validate_attribute_name(name)?;
    }
    Ok(attributes
        .filter(|attr| attribute_type.map_or(true, |t| attr.attribute_type == t))
        .filter(|attr| name.map_or(true, |n| attr.name == n))
        .collect())
}
