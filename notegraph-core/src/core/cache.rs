//! Async entry points of the note graph cache.
//!
//! [`GraphCache`] owns the [`Graph`] and is the only writer to it. Methods
//! that may reconcile server data take `&mut self`, so two loads can never
//! interleave their mutations; content fetches take `&self` and are
//! coalesced by [`BlobCache`].

use crate::core::note::NONE_NOTE_ID;
use crate::{
    Attachment, Blob, BlobCache, BlobEntity, Branch, BranchRow, CacheConfig, Graph, LoadResults,
    NoteRef, NoteType, NotegraphError, Result, SubtreeResponse, Transport,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Notification sent to subscribers after the graph changed.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// The listed notes were (re)loaded from the server.
    NotesReloaded { note_ids: Vec<String> },
    /// A batch of server change notifications was applied.
    EntitiesReloaded(LoadResults),
}

/// Result of evaluating a saved search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Number of result notes now hanging below the search note.
    pub result_count: usize,
    /// Error reported by the search engine for an unparsable query.
    pub error: Option<String>,
}

/// Client-side cache of a server-held note graph.
pub struct GraphCache<T: Transport + 'static> {
    transport: Arc<T>,
    graph: Graph,
    blobs: BlobCache,
    events: broadcast::Sender<CacheEvent>,
    options: HashMap<String, String>,
    config: CacheConfig,
}

impl<T: Transport + 'static> GraphCache<T> {
    pub fn new(transport: T, config: CacheConfig) -> Self {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    pub fn with_shared_transport(transport: Arc<T>, config: CacheConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            transport,
            graph: Graph::new(),
            blobs: BlobCache::new(config.blob_retention()),
            events,
            options: HashMap::new(),
            config,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub(crate) fn blobs(&self) -> &BlobCache {
        &self.blobs
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        if self.events.send(event).is_err() {
            log::trace!("Cache event dropped: no subscribers");
        }
    }

    /// Value of an option received through entity changes.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub(crate) fn set_option(&mut self, name: String, value: String) {
        self.options.insert(name, value);
    }

    /// Opens or closes the protected session. Protected content only counts
    /// as available while a session is open.
    pub fn set_protected_session_available(&mut self, available: bool) {
        self.graph.set_protected_session_available(available);
    }

    pub fn note_from_cache(&self, note_id: &str) -> Option<NoteRef<'_>> {
        self.graph.note(note_id)
    }

    // ------------------------------------------------------------------
    // Tree loading
    // ------------------------------------------------------------------

    /// Replaces the whole graph with a fresh tree from the server.
    ///
    /// The graph and the shared content fetches are cleared only once the
    /// response has arrived, so a failed load leaves the previous state in place.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn load_initial_tree(&mut self) -> Result<()> {
        let response = self.transport.load_tree(None).await?;
        self.graph.clear();
        self.blobs.clear();
        self.graph.add_response(response);
        log::info!("Loaded note tree with {} notes", self.graph.note_count());
        Ok(())
    }

    /// Merges the subtree below `sub_tree_note_id` and returns that note.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::InvalidNoteId`] for an empty ID and propagates transport failures.
    pub async fn load_sub_tree(&mut self, sub_tree_note_id: &str) -> Result<Option<NoteRef<'_>>> {
        if sub_tree_note_id.is_empty() {
            return Err(NotegraphError::InvalidNoteId(sub_tree_note_id.to_string()));
        }
        let response = self.transport.load_tree(Some(sub_tree_note_id)).await?;
        self.graph.add_response(response);
        Ok(self.graph.note(sub_tree_note_id))
    }

    /// Fetches the given notes in one request and merges them, then notifies
    /// subscribers. Duplicate IDs are requested once; an empty list does nothing.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn reload_notes<S: AsRef<str>>(&mut self, note_ids: &[S]) -> Result<()> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = note_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();
        if unique.is_empty() {
            return Ok(());
        }

        let response = self.transport.load_notes(&unique).await?;
        self.graph.add_response(response);
        log::debug!("Reloaded {} notes", unique.len());

        self.emit(CacheEvent::NotesReloaded { note_ids: unique });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Note access
    // ------------------------------------------------------------------

    /// Returns one entry per requested ID, in request order.
    ///
    /// Missing notes are fetched with a single request for their unique IDs.
    /// Notes the server does not know are left out, and logged unless `silent`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn get_notes<S: AsRef<str>>(&mut self, note_ids: &[S], silent: bool) -> Result<Vec<NoteRef<'_>>> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }
        let missing: Vec<&str> = note_ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| !self.graph.note_exists(id))
            .collect();
        self.reload_notes(&missing).await?;
        Ok(self.graph.notes_from_cache(note_ids, silent))
    }

    /// Returns the note, fetching it if needed. Empty IDs and the root's
    /// pseudo parent resolve to `None`.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn get_note(&mut self, note_id: &str, silent: bool) -> Result<Option<NoteRef<'_>>> {
        if note_id.is_empty() || note_id == NONE_NOTE_ID {
            log::trace!("Ignoring request for note '{note_id}'");
            return Ok(None);
        }
        Ok(self.get_notes(&[note_id], silent).await?.into_iter().next())
    }

    /// True if the server knows the note. Fetches it if needed.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn note_exists(&mut self, note_id: &str) -> Result<bool> {
        Ok(self.get_note(note_id, true).await?.is_some())
    }

    /// Children of a note in branch order, loading any that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::NoteNotFound`] if the parent is not cached; propagates transport failures.
    pub async fn child_notes(&mut self, note_id: &str) -> Result<Vec<NoteRef<'_>>> {
        let children = self.graph.require_note(note_id)?.children().to_vec();
        self.get_notes(&children, false).await
    }

    /// Targets of the note's effective relations, loading any that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::MalformedQuery`] for a prefixed name,
    /// [`NotegraphError::NoteNotFound`] if the note is not cached, and
    /// propagates transport failures.
    pub async fn relation_targets(&mut self, note_id: &str, name: Option<&str>) -> Result<Vec<NoteRef<'_>>> {
        let targets: Vec<String> = self
            .graph
            .require_note(note_id)?
            .relations(name)?
            .into_iter()
            .filter_map(|rel| rel.target_note_id().map(str::to_string))
            .collect();
        self.get_notes(&targets, true).await
    }

    /// Owners of the relations pointing at the note, loading any that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::NoteNotFound`] if the note is not cached; propagates transport failures.
    pub async fn target_relation_source_notes(&mut self, note_id: &str) -> Result<Vec<NoteRef<'_>>> {
        let mut seen = HashSet::new();
        let owners: Vec<String> = self
            .graph
            .require_note(note_id)?
            .target_relations()
            .into_iter()
            .map(|rel| rel.note_id.clone())
            .filter(|owner| seen.insert(owner.clone()))
            .collect();
        self.get_notes(&owners, true).await
    }

    /// IDs of all descendants in pre-order, excluding the note itself.
    ///
    /// Archived notes and everything below them are skipped unless
    /// `include_archived`. A note cloned into several places is listed once.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn subtree_note_ids(&mut self, note_id: &str, include_archived: bool) -> Result<Vec<String>> {
        let mut result = Vec::new();
        let mut visited = HashSet::from([note_id.to_string()]);
        let mut stack = vec![note_id.to_string()];

        while let Some(current) = stack.pop() {
            if current != note_id {
                result.push(current.clone());
            }
            let Some(children) = self.graph.note(&current).map(|note| note.children().to_vec()) else {
                continue;
            };
            self.get_notes(&children, true).await?;

            let graph = &self.graph;
            let kept: Vec<String> = children
                .into_iter()
                .filter(|id| visited.insert(id.clone()))
                .filter(|id| include_archived || graph.note(id).is_some_and(|child| !child.is_archived()))
                .collect();
            stack.extend(kept.into_iter().rev());
        }

        Ok(result)
    }

    // ------------------------------------------------------------------
    // Saved searches
    // ------------------------------------------------------------------

    /// Evaluates a saved search and hangs its results below it as virtual branches.
    ///
    /// Previous results are dropped first; reloading the same result set
    /// produces the same branch IDs. Returns `None` if the note does not
    /// exist or is not a saved search.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::SearchFailed`] if the search request fails,
    /// and propagates transport failures while loading the note.
    pub async fn load_search_note(&mut self, note_id: &str) -> Result<Option<SearchOutcome>> {
        match self.get_note(note_id, false).await? {
            Some(note) if note.note_type == NoteType::Search => {}
            _ => return Ok(None),
        }

        let response = self
            .transport
            .search_note(note_id)
            .await
            .map_err(|e| NotegraphError::SearchFailed {
                note_id: note_id.to_string(),
                message: e.to_string(),
            })?;

        self.graph.clear_virtual_children(note_id);

        let note = self.graph.require_note(note_id)?;
        let note_row = note.to_row();
        let mut branches: Vec<BranchRow> = note
            .parent_branches()
            .into_iter()
            .chain(note.child_branches())
            .map(Branch::to_row)
            .collect();
        branches.extend(
            response
                .search_result_note_ids
                .iter()
                .enumerate()
                .map(|(index, result_id)| BranchRow {
                    branch_id: Branch::virtual_id(note_id, result_id),
                    note_id: result_id.clone(),
                    parent_note_id: note_id.to_string(),
                    note_position: (index as i64 + 1) * 10,
                    prefix: None,
                    is_expanded: false,
                    from_search_note: true,
                }),
        );

        self.graph.add_response(SubtreeResponse {
            notes: vec![note_row],
            branches,
            attributes: Vec::new(),
        });
        self.graph.set_search_results(note_id, response.highlighted_tokens);

        let result_count = response.search_result_note_ids.len();
        log::debug!("Search note '{note_id}' returned {result_count} results");
        Ok(Some(SearchOutcome {
            result_count,
            error: response.error,
        }))
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Content of a note or attachment. Concurrent requests for the same
    /// entity share one fetch; a failed fetch yields `None`.
    pub async fn get_blob(&self, entity: BlobEntity, entity_id: &str) -> Option<Arc<Blob>> {
        self.blobs.get(&self.transport, entity, entity_id).await
    }

    pub async fn note_content(&self, note_id: &str) -> Option<Arc<Blob>> {
        self.get_blob(BlobEntity::Notes, note_id).await
    }

    /// Note content parsed as JSON; `None` if missing or malformed.
    pub async fn note_json_content(&self, note_id: &str) -> Option<serde_json::Value> {
        self.note_content(note_id).await?.json_content()
    }

    pub async fn attachment_blob(&self, attachment_id: &str) -> Option<Arc<Blob>> {
        self.get_blob(BlobEntity::Attachments, attachment_id).await
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    /// Attachments of a note, loaded once and then served from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`NotegraphError::InvalidNoteId`] for an empty ID and propagates transport failures.
    pub async fn note_attachments(&mut self, note_id: &str) -> Result<Vec<&Attachment>> {
        if note_id.is_empty() {
            return Err(NotegraphError::InvalidNoteId(note_id.to_string()));
        }
        let loaded = self
            .graph
            .note(note_id)
            .and_then(|note| note.attachment_ids().map(<[String]>::to_vec));

        let ids = match loaded {
            Some(ids) => ids,
            None => {
                let rows = self.transport.note_attachments(note_id).await?;
                self.graph.set_note_attachments(note_id, rows)
            }
        };
        Ok(ids.iter().filter_map(|id| self.graph.attachment(id)).collect())
    }

    /// # Errors
    ///
    /// Same as [`GraphCache::note_attachments`].
    pub async fn attachments_by_role(&mut self, note_id: &str, role: &str) -> Result<Vec<&Attachment>> {
        Ok(self
            .note_attachments(note_id)
            .await?
            .into_iter()
            .filter(|attachment| attachment.role == role)
            .collect())
    }

    /// Returns an attachment, loading all of its siblings in one request if needed.
    ///
    /// With `silent`, a failed request or an unknown attachment yields `None`.
    ///
    /// # Errors
    ///
    /// Without `silent`, propagates transport failures and returns
    /// [`NotegraphError::AttachmentNotFound`] if the server does not know the attachment.
    pub async fn get_attachment(&mut self, attachment_id: &str, silent: bool) -> Result<Option<&Attachment>> {
        if self.graph.attachment(attachment_id).is_some() {
            return Ok(self.graph.attachment(attachment_id));
        }

        let rows = match self.transport.attachment_siblings(attachment_id).await {
            Ok(rows) => rows,
            Err(e) if silent => {
                log::info!("Attachment '{attachment_id}' could not be loaded: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if let Some(owner_id) = rows.first().map(|row| row.owner_id.clone()) {
            self.graph.set_note_attachments(&owner_id, rows);
        }

        match self.graph.attachment(attachment_id) {
            None if !silent => Err(NotegraphError::AttachmentNotFound(attachment_id.to_string())),
            found => Ok(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{attachment_row, FakeTransport, GraphBuilder};
    use std::time::Duration;

    fn server() -> GraphBuilder {
        GraphBuilder::new()
            .note("a", NoteType::Text)
            .note("b", NoteType::Text)
            .note("c", NoteType::Text)
            .note("s", NoteType::Search)
            .branch("root", "a", 10)
            .branch("root", "b", 20)
            .branch("a", "c", 10)
            .branch("root", "s", 30)
    }

    fn cache_over(builder: GraphBuilder) -> GraphCache<FakeTransport> {
        GraphCache::new(FakeTransport::default().with_tree(builder.response()), CacheConfig::default())
    }

    #[tokio::test]
    async fn test_get_notes_deduplicates_request() {
        let mut cache = cache_over(server());

        let notes = cache.get_notes(&["a", "a", "b"], false).await.unwrap();
        let ids: Vec<&str> = notes.iter().map(|n| n.note_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a", "b"]);
        assert!(std::ptr::eq(notes[0].note(), notes[1].note()));

        assert_eq!(cache.transport().requests(), vec!["load_notes:a,b".to_string()]);
    }

    #[tokio::test]
    async fn test_cached_notes_are_not_refetched() {
        let mut cache = cache_over(server());
        cache.get_notes(&["a"], false).await.unwrap();
        cache.get_notes(&["a", "b"], false).await.unwrap();
        assert_eq!(
            cache.transport().requests(),
            vec!["load_notes:a".to_string(), "load_notes:b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_notes_are_omitted() {
        let mut cache = cache_over(server());
        let notes = cache.get_notes(&["a", "ghost"], true).await.unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_get_note_ignores_placeholder_ids() {
        let mut cache = cache_over(server());
        assert!(cache.get_note("", false).await.unwrap().is_none());
        assert!(cache.get_note("none", false).await.unwrap().is_none());
        assert!(cache.transport().requests().is_empty());
        assert!(cache.note_exists("a").await.unwrap());
        assert!(!cache.note_exists("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_reload_notes_notifies_subscribers() {
        let mut cache = cache_over(server());
        let mut events = cache.subscribe();

        cache.reload_notes(&["b", "a", "b"]).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            CacheEvent::NotesReloaded {
                note_ids: vec!["b".to_string(), "a".to_string()]
            }
        );

        cache.reload_notes::<&str>(&[]).await.unwrap();
        assert_eq!(cache.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_load_initial_tree_replaces_graph() {
        let mut cache = cache_over(server());
        cache.load_initial_tree().await.unwrap();
        assert_eq!(cache.graph().note_count(), 5);
        assert_eq!(cache.graph().note("root").unwrap().children(), ["a", "b", "s"]);

        cache.transport().set_tree(GraphBuilder::new().note("x", NoteType::Text).branch("root", "x", 10).response());
        cache.load_initial_tree().await.unwrap();
        assert!(cache.graph().note("a").is_none());
        assert_eq!(cache.graph().note("root").unwrap().children(), ["x"]);
    }

    #[tokio::test]
    async fn test_load_sub_tree() {
        let mut cache = cache_over(server());
        let a = cache.load_sub_tree("a").await.unwrap().unwrap();
        assert_eq!(a.children(), ["c"]);
        assert!(matches!(cache.load_sub_tree("").await, Err(NotegraphError::InvalidNoteId(_))));
    }

    #[tokio::test]
    async fn test_load_search_note_layers_virtual_children() {
        let mut cache = cache_over(server());
        cache.load_initial_tree().await.unwrap();
        cache.transport().put_search("s", &["b", "c"]);

        let outcome = cache.load_search_note("s").await.unwrap().unwrap();
        assert_eq!(outcome, SearchOutcome { result_count: 2, error: None });

        let graph = cache.graph();
        let s = graph.note("s").unwrap();
        assert_eq!(s.children(), ["b", "c"]);
        assert!(s.search_results_loaded());
        let branch = graph.branch("virt-s-c", false).unwrap();
        assert_eq!(branch.note_position, 20);
        assert!(branch.from_search_note);
        assert_eq!(s.parents(), ["root"]);
        assert_eq!(graph.note("c").unwrap().parents(), ["a", "s"]);
    }

    #[tokio::test]
    async fn test_search_reload_replaces_previous_results() {
        let mut cache = cache_over(server());
        cache.load_initial_tree().await.unwrap();
        cache.transport().put_search("s", &["b", "c"]);
        cache.load_search_note("s").await.unwrap();

        cache.transport().put_search("s", &["a"]);
        cache.load_search_note("s").await.unwrap();
        let graph = cache.graph();
        assert_eq!(graph.note("s").unwrap().children(), ["a"]);
        assert!(graph.branch("virt-s-b", true).is_none());
        assert_eq!(graph.note("b").unwrap().parents(), ["root"]);

        cache.load_search_note("s").await.unwrap();
        assert_eq!(cache.graph().note("s").unwrap().children(), ["a"]);
    }

    #[tokio::test]
    async fn test_reconciling_search_parent_keeps_results() {
        let mut cache = cache_over(server());
        cache.load_initial_tree().await.unwrap();
        cache.transport().put_search("s", &["b"]);
        cache.load_search_note("s").await.unwrap();

        cache.reload_notes(&["s", "root"]).await.unwrap();
        assert_eq!(cache.graph().note("s").unwrap().children(), ["b"]);
        assert!(cache.graph().branch("virt-s-b", true).is_some());
    }

    #[tokio::test]
    async fn test_load_search_note_rejects_other_types() {
        let mut cache = cache_over(server());
        assert!(cache.load_search_note("a").await.unwrap().is_none());
        assert!(matches!(
            cache.load_search_note("s").await,
            Err(NotegraphError::SearchFailed { note_id, .. }) if note_id == "s"
        ));
    }

    #[tokio::test]
    async fn test_subtree_note_ids_skips_archived() {
        let mut cache = cache_over(
            server()
                .note("d", NoteType::Text)
                .note("e", NoteType::Text)
                .branch("a", "d", 20)
                .branch("d", "e", 10)
                .label("arch", "d", "archived", "", false),
        );
        cache.get_note("root", false).await.unwrap();

        assert_eq!(cache.subtree_note_ids("root", false).await.unwrap(), vec!["a", "c", "b", "s"]);
        assert_eq!(
            cache.subtree_note_ids("root", true).await.unwrap(),
            vec!["a", "c", "d", "e", "b", "s"]
        );
    }

    #[tokio::test]
    async fn test_child_notes_and_relation_targets() {
        let mut cache = cache_over(server().relation("r", "b", "author", "c", false));
        cache.get_notes(&["root", "b"], false).await.unwrap();

        let children: Vec<String> = cache
            .child_notes("root")
            .await
            .unwrap()
            .iter()
            .map(|n| n.note_id.clone())
            .collect();
        assert_eq!(children, vec!["a", "b", "s"]);

        let targets = cache.relation_targets("b", Some("author")).await.unwrap();
        assert_eq!(targets[0].note_id, "c");
        let sources = cache.target_relation_source_notes("c").await.unwrap();
        assert_eq!(sources[0].note_id, "b");
    }

    #[tokio::test]
    async fn test_note_attachments_are_memoized() {
        let mut cache = cache_over(server());
        cache.get_note("a", false).await.unwrap();
        cache.transport().put_attachment(attachment_row("img1", "a", "image"));
        cache.transport().put_attachment(attachment_row("doc1", "a", "file"));

        assert_eq!(cache.note_attachments("a").await.unwrap().len(), 2);
        let images = cache.attachments_by_role("a", "image").await.unwrap();
        assert_eq!(images[0].attachment_id, "img1");

        let attachment_requests = cache
            .transport()
            .requests()
            .iter()
            .filter(|r| r.starts_with("note_attachments"))
            .count();
        assert_eq!(attachment_requests, 1);
    }

    #[tokio::test]
    async fn test_get_attachment_loads_siblings() {
        let mut cache = cache_over(server());
        cache.get_note("a", false).await.unwrap();
        cache.transport().put_attachment(attachment_row("img1", "a", "image"));
        cache.transport().put_attachment(attachment_row("doc1", "a", "file"));

        assert!(cache.get_attachment("img1", false).await.unwrap().is_some());
        assert!(cache.graph().attachment("doc1").is_some());
        assert_eq!(cache.graph().note("a").unwrap().attachment_ids().unwrap().len(), 2);

        assert!(cache.get_attachment("nope", true).await.unwrap().is_none());
        assert!(cache.get_attachment("nope", false).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blob_accessors() {
        let transport = FakeTransport::default().with_delay(Duration::from_millis(10));
        transport.put_blob(BlobEntity::Notes, "cfg", r#"{"zoom":2}"#);
        transport.put_blob(BlobEntity::Attachments, "att", "binary");
        let cache = GraphCache::new(transport, CacheConfig::default());

        let (first, second) = tokio::join!(cache.note_content("cfg"), cache.note_content("cfg"));
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(cache.transport().blob_requests(), 1);
        assert_eq!(cache.note_json_content("cfg").await.unwrap()["zoom"], 2);
        assert_eq!(cache.attachment_blob("att").await.unwrap().content, "binary");
        assert!(cache.note_content("missing").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_initial_tree_drops_shared_content() {
        let transport = FakeTransport::default().with_tree(server().response());
        transport.put_blob(BlobEntity::Notes, "a", "before");
        let mut cache = GraphCache::new(transport, CacheConfig::default().with_blob_retention(Duration::from_secs(60)));

        assert_eq!(cache.note_content("a").await.unwrap().content, "before");
        cache.transport().put_blob(BlobEntity::Notes, "a", "after");
        assert_eq!(cache.note_content("a").await.unwrap().content, "before");

        cache.load_initial_tree().await.unwrap();
        assert_eq!(cache.note_content("a").await.unwrap().content, "after");
        assert_eq!(cache.transport().blob_requests(), 2);
    }

    #[tokio::test]
    async fn test_protected_session_toggle() {
        let mut cache = cache_over(server());
        cache.set_protected_session_available(true);
        assert!(cache.graph().is_protected_session_available());
    }
}
