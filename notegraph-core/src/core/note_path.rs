//! Root-to-note path enumeration, "best path" ranking and the visibility
//! predicates built on the same parent traversal.

use crate::core::note::{HIDDEN_ROOT_ID, ROOT_NOTE_ID, SHARE_ROOT_ID};
use crate::{NoteRef, NoteType};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

/// Separator of serialized note paths (`root/a1/b2`).
pub const NOTE_PATH_SEPARATOR: char = '/';

/// One root-to-note path with the flags used to rank it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePathRecord {
    pub note_path: Vec<String>,
    pub is_in_hoisted_sub_tree: bool,
    pub is_archived: bool,
    pub is_search: bool,
    pub is_hidden: bool,
}

impl NotePathRecord {
    /// The path in `root/a/b` form.
    pub fn to_path_string(&self) -> String {
        self.note_path.join("/")
    }
}

/// Number of leading segments `path` shares with `target`.
fn prefix_match_len(path: &[String], target: &[&str]) -> usize {
    path.iter()
        .zip(target)
        .take_while(|(seg, target_seg)| seg.as_str() == **target_seg)
        .count()
}

impl<'g> NoteRef<'g> {
    /// Every root-to-note path, each ending with this note's ID.
    ///
    /// Saved-search parents are not followed. A parent already on the path
    /// being built is skipped, so a malformed cyclic graph still terminates.
    pub fn all_note_paths(&self) -> Vec<Vec<String>> {
        let mut on_path = Vec::new();
        self.collect_note_paths(&mut on_path)
    }

    fn collect_note_paths(&self, on_path: &mut Vec<&'g str>) -> Vec<Vec<String>> {
        if self.is_root() {
            return vec![vec![ROOT_NOTE_ID.to_string()]];
        }

        on_path.push(self.note().note_id.as_str());

        let parents: Vec<NoteRef<'g>> = self
            .parent_notes()
            .into_iter()
            .filter(|parent| parent.note_type != NoteType::Search)
            .filter(|parent| !on_path.contains(&parent.note().note_id.as_str()))
            .collect();

        let mut paths = match parents.as_slice() {
            [single] => single.collect_note_paths(on_path),
            many => many
                .iter()
                .flat_map(|parent| parent.collect_note_paths(on_path))
                .collect(),
        };

        on_path.pop();

        for path in &mut paths {
            path.push(self.note_id.clone());
        }
        paths
    }

    /// All paths ranked best-first.
    ///
    /// `active_note_path` is a serialized path (`root/a/b`); when given, paths
    /// sharing a longer prefix with it win before any other criterion.
    pub fn sorted_note_path_records(
        &self,
        hoisted_note_id: &str,
        active_note_path: Option<&str>,
    ) -> Vec<NotePathRecord> {
        let graph = self.graph();
        let is_hoisted_root = hoisted_note_id == ROOT_NOTE_ID;

        let mut records: Vec<NotePathRecord> = self
            .all_note_paths()
            .into_iter()
            .map(|path| {
                let on_path = || path.iter().filter_map(|id| graph.note(id));
                NotePathRecord {
                    is_in_hoisted_sub_tree: is_hoisted_root || path.iter().any(|id| id == hoisted_note_id),
                    is_archived: on_path().any(|note| note.is_archived()),
                    is_search: on_path().any(|note| note.note_type == NoteType::Search),
                    is_hidden: path.iter().any(|id| id == HIDDEN_ROOT_ID),
                    note_path: path,
                }
            })
            .collect();

        let active_segments: Option<Vec<&str>> =
            active_note_path.map(|p| p.split(NOTE_PATH_SEPARATOR).collect());

        records.sort_by(|a, b| {
            let by_overlap = match &active_segments {
                Some(segments) => {
                    Reverse(prefix_match_len(&a.note_path, segments))
                        .cmp(&Reverse(prefix_match_len(&b.note_path, segments)))
                }
                None => Ordering::Equal,
            };
            by_overlap
                .then(b.is_in_hoisted_sub_tree.cmp(&a.is_in_hoisted_sub_tree))
                .then(a.is_archived.cmp(&b.is_archived))
                .then(a.is_hidden.cmp(&b.is_hidden))
                .then(a.is_search.cmp(&b.is_search))
                .then(a.note_path.len().cmp(&b.note_path.len()))
        });

        records
    }

    pub fn best_note_path(&self, hoisted_note_id: &str, active_note_path: Option<&str>) -> Option<Vec<String>> {
        self.sorted_note_path_records(hoisted_note_id, active_note_path)
            .into_iter()
            .next()
            .map(|record| record.note_path)
    }

    /// Best path serialized as `root/a/b`, or `None` for a note with no path to the root.
    pub fn best_note_path_string(&self, hoisted_note_id: &str) -> Option<String> {
        self.best_note_path(hoisted_note_id, None)
            .map(|path| path.join("/"))
    }

    /// True when no parent chain reaches the root without passing through the
    /// hidden subtree or a saved search.
    pub fn is_hidden_completely(&self) -> bool {
        self.hidden_completely(&mut HashSet::new())
    }

    fn hidden_completely(&self, visited: &mut HashSet<&'g str>) -> bool {
        let note_id = self.note().note_id.as_str();
        if note_id == HIDDEN_ROOT_ID {
            return true;
        }
        if note_id == ROOT_NOTE_ID {
            return false;
        }
        if !visited.insert(note_id) {
            return true;
        }

        for parent in self.parent_notes() {
            if parent.note_id == ROOT_NOTE_ID {
                return false;
            }
            if parent.note_id == HIDDEN_ROOT_ID || parent.note_type == NoteType::Search {
                continue;
            }
            if !parent.hidden_completely(visited) {
                return false;
            }
        }
        true
    }

    /// True if some non-search ancestor chain reaches the share root.
    pub fn is_shared(&self) -> bool {
        self.shared(&mut HashSet::new())
    }

    fn shared(&self, visited: &mut HashSet<&'g str>) -> bool {
        if !visited.insert(self.note().note_id.as_str()) {
            return false;
        }
        self.parent_notes()
            .into_iter()
            .filter(|parent| parent.note_type != NoteType::Search)
            .any(|parent| parent.note_id == SHARE_ROOT_ID || parent.shared(visited))
    }

    /// True if `ancestor_note_id` is this note or one of its ancestors.
    ///
    /// With `follow_templates`, `template`/`inherit` targets count as parents.
    /// A fresh visited set is used per call, so no state leaks between queries.
    pub fn has_ancestor(&self, ancestor_note_id: &str, follow_templates: bool) -> bool {
        self.reaches_ancestor(ancestor_note_id, follow_templates, &mut HashSet::new())
    }

    fn reaches_ancestor(
        &self,
        ancestor_note_id: &str,
        follow_templates: bool,
        visited: &mut HashSet<&'g str>,
    ) -> bool {
        let note_id = self.note().note_id.as_str();
        if note_id == ancestor_note_id {
            return true;
        }
        // A template may be a descendant of its instance.
        if !visited.insert(note_id) {
            return false;
        }

        if follow_templates
            && self
                .notes_to_inherit_from()
                .into_iter()
                .any(|template| template.reaches_ancestor(ancestor_note_id, follow_templates, visited))
        {
            return true;
        }

        self.parent_notes()
            .into_iter()
            .any(|parent| parent.reaches_ancestor(ancestor_note_id, follow_templates, visited))
    }

    pub fn is_in_hidden_subtree(&self) -> bool {
        self.has_ancestor(HIDDEN_ROOT_ID, false)
    }
}
