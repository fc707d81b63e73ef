// Querydeck Workspace Controller
//
// The single entry point for views. Composes the tab components, routes every
// command through them and announces each outcome on the event bus. Views
// subscribe to events instead of re-reading state.

use chrono::Utc;
use log::{debug, info, warn};

use querydeck_utils::data::{QueryResult, QueryStatus, Script, ScriptId};
use querydeck_utils::notice::Notice;
use querydeck_utils::session::SessionSnapshot;

use crate::backends::{BackendError, ScriptDraft};
use crate::catalog::ScriptCatalog;
use crate::config::WorkspaceConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::events::{EventBus, ListenerId, WorkspaceEvent};
use crate::session::SessionCodec;
use crate::tabs::{
    ActiveSelection, DocumentContentTracker, Tab, TabId, TabRegistry, TempIdAllocator,
};

/// Everything needed to send one script to the store, captured under the
/// workspace lock and carried across the backend call.
#[derive(Debug, Clone)]
pub(crate) struct SaveRequest {
    pub tab_id: TabId,
    pub script: Script,
    pub draft: ScriptDraft,
}

#[derive(Debug)]
pub struct Workspace {
    registry: TabRegistry,
    tracker: DocumentContentTracker,
    selection: ActiveSelection,
    allocator: TempIdAllocator,
    catalog: ScriptCatalog,
    events: EventBus,
    untitled_name: String,
    /// Snapshot keys owned by the UI shell, written back unchanged
    shell_state: serde_json::Map<String, serde_json::Value>,
    revision: u64,
    saved_revision: u64,
}

impl Workspace {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            registry: TabRegistry::new(),
            tracker: DocumentContentTracker::new(),
            selection: ActiveSelection::new(),
            allocator: TempIdAllocator::new(),
            catalog: ScriptCatalog::new(),
            events: EventBus::new(),
            untitled_name: config.untitled_name.clone(),
            shell_state: serde_json::Map::new(),
            revision: 0,
            saved_revision: 0,
        }
    }

    // Observers

    pub fn subscribe(&mut self, listener: impl FnMut(&WorkspaceEvent) + Send + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn notify(&mut self, notice: Notice) {
        self.events.emit(WorkspaceEvent::Notice(notice));
    }

    // Queries

    pub fn tabs(&self) -> &[Tab] {
        self.registry.tabs()
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.registry.get(id)
    }

    pub fn active_tab_id(&self) -> Option<&TabId> {
        self.selection.active_id()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.selection.get_active(&self.registry)
    }

    /// Content the editor should be showing.
    pub fn live_buffer(&self) -> &str {
        self.tracker.live_buffer()
    }

    pub fn next_temp_id(&self) -> i64 {
        self.allocator.peek()
    }

    pub fn catalog(&self) -> &ScriptCatalog {
        &self.catalog
    }

    /// Incremented by every command that changes what a snapshot would hold.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn needs_session_save(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Record that the state as of `revision` reached session storage.
    pub fn mark_session_saved(&mut self, revision: u64) {
        self.saved_revision = self.saved_revision.max(revision);
    }

    // Opening and focus

    /// Open a script, or focus its tab if already open.
    pub fn open_script(&mut self, script: Script) -> TabId {
        self.catalog.insert(script.clone());
        let mut tab = Tab::script(script);
        tab.refresh_dirty();
        self.open_and_focus(tab)
    }

    pub fn open_table_view(&mut self, table_name: &str, schema: &str, connection_id: &str) -> TabId {
        self.open_and_focus(Tab::table_view(table_name, schema, connection_id))
    }

    /// Open an empty never-saved script.
    pub fn create_new_script(&mut self) -> TabId {
        self.create_script_with(String::new())
    }

    /// Open a never-saved script pre-filled with a query from history.
    pub fn create_script_from_history(&mut self, query: &str) -> TabId {
        self.create_script_with(query.to_string())
    }

    /// Make sure there is something to type into: reuse the base untitled
    /// script if the store has one, otherwise create a new script. Does
    /// nothing when tabs are already open.
    pub fn ensure_starter_tab(&mut self) -> Option<TabId> {
        if !self.registry.is_empty() {
            return None;
        }
        match self.catalog.find_by_name(&self.untitled_name).cloned() {
            Some(script) => Some(self.open_script(script)),
            None => Some(self.create_new_script()),
        }
    }

    pub fn switch_to_tab(&mut self, tab_id: &TabId) -> bool {
        self.activate(tab_id, false)
    }

    // Content

    /// Editor changed the active buffer.
    ///
    /// Returns the active script tab's new dirty flag, or `None` when no
    /// script tab is active.
    pub fn handle_editor_change(&mut self, content: impl Into<String>) -> Option<bool> {
        let content = content.into();
        self.tracker.set_live_buffer(content.clone());
        let active = self.selection.active_id()?.clone();
        self.apply_content(&active, content)
    }

    /// Store content on any script tab. The live buffer follows when the
    /// tab is active.
    pub fn update_content(&mut self, tab_id: &TabId, content: impl Into<String>) -> Option<bool> {
        let content = content.into();
        if self.selection.is_active(tab_id) {
            self.tracker.set_live_buffer(content.clone());
        }
        self.apply_content(tab_id, content)
    }

    /// Adopt `content` as the saved baseline of a script's tab.
    pub fn mark_script_saved(&mut self, script_id: ScriptId, content: &str) -> bool {
        if !self.tracker.mark_saved(&mut self.registry, script_id, content) {
            return false;
        }
        self.catalog.set_query_text(script_id, content);

        let tab = TabId::for_script(script_id);
        if self.selection.is_active(&tab) {
            self.tracker.set_live_buffer(content);
        }
        self.events.emit(WorkspaceEvent::ContentChanged { tab, is_dirty: false });
        self.touch();
        true
    }

    /// Move a script to its store-issued identity.
    ///
    /// The catalog entry is always replaced. Returns the new tab id when the
    /// script had an open tab.
    pub fn update_script_id(&mut self, old: ScriptId, saved: Script) -> Option<TabId> {
        let new_id = saved.id;
        self.catalog.remove(old);
        self.catalog.insert(saved.clone());

        let Some((from, to)) = self.registry.rekey_script(old, saved) else {
            self.touch();
            return None;
        };
        self.selection.follow_rename(&from, &to);
        info!("Querydeck: script {} saved as {}", old, new_id);

        self.events.emit(WorkspaceEvent::ScriptIdRemapped {
            from,
            to: to.clone(),
        });
        self.touch();
        Some(to)
    }

    /// Rename a script tab and its record. Blank names are rejected.
    pub fn rename_script(&mut self, tab_id: &TabId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(tab) = self.registry.get_mut(tab_id) else {
            return false;
        };
        if !tab.can_rename {
            return false;
        }
        let Some(script) = tab.as_script_mut() else {
            return false;
        };
        script.script.name = name.to_string();
        let script_id = script.script_id();
        tab.title = name.to_string();

        self.catalog.rename(script_id, name);
        self.events.emit(WorkspaceEvent::TabRenamed {
            tab: tab_id.clone(),
            title: name.to_string(),
        });
        self.touch();
        true
    }

    /// Replace the persisted scripts known to the workspace.
    pub fn set_scripts(&mut self, scripts: Vec<Script>) {
        debug!("Querydeck: catalog refreshed with {} scripts", scripts.len());
        self.catalog.replace_persisted(scripts);
    }

    // Query output

    pub fn set_query_status(&mut self, tab_id: &TabId, status: QueryStatus) -> bool {
        let Some(script) = self.registry.get_mut(tab_id).and_then(Tab::as_script_mut) else {
            return false;
        };
        script.query_status = status;
        self.events.emit(WorkspaceEvent::QueryStatusChanged {
            tab: tab_id.clone(),
            status,
        });
        true
    }

    pub fn set_query_results(&mut self, tab_id: &TabId, results: Vec<QueryResult>) -> bool {
        let Some(script) = self.registry.get_mut(tab_id).and_then(Tab::as_script_mut) else {
            return false;
        };
        script.results = Some(results);
        script.error = None;
        self.set_query_status(tab_id, QueryStatus::Completed)
    }

    pub fn set_query_error(&mut self, tab_id: &TabId, error: impl Into<String>) -> bool {
        let Some(script) = self.registry.get_mut(tab_id).and_then(Tab::as_script_mut) else {
            return false;
        };
        script.error = Some(error.into());
        script.results = None;
        self.set_query_status(tab_id, QueryStatus::Error)
    }

    // Ordering and pinning

    pub fn pin_tab(&mut self, tab_id: &TabId) -> bool {
        let pinned = self.registry.pin(tab_id);
        if pinned {
            self.events.emit(WorkspaceEvent::TabPinned {
                tab: tab_id.clone(),
                pinned: true,
            });
            self.touch();
        }
        pinned
    }

    pub fn unpin_tab(&mut self, tab_id: &TabId) -> bool {
        let unpinned = self.registry.unpin(tab_id);
        if unpinned {
            self.events.emit(WorkspaceEvent::TabPinned {
                tab: tab_id.clone(),
                pinned: false,
            });
            self.touch();
        }
        unpinned
    }

    pub fn reorder_tabs(&mut self, from: usize, to: usize) -> bool {
        let moved = self.registry.reorder(from, to);
        if moved {
            self.events.emit(WorkspaceEvent::TabsReordered);
            self.touch();
        }
        moved
    }

    // Closing

    pub fn close_tab(&mut self, tab_id: &TabId) -> bool {
        match self.registry.close(tab_id) {
            Some(tab) => {
                self.after_removal(vec![tab]);
                true
            }
            None => false,
        }
    }

    pub fn close_tabs_to_left(&mut self, tab_id: &TabId) -> usize {
        let removed = self.registry.close_to_left(tab_id);
        self.after_removal(removed)
    }

    pub fn close_tabs_to_right(&mut self, tab_id: &TabId) -> usize {
        let removed = self.registry.close_to_right(tab_id);
        self.after_removal(removed)
    }

    pub fn close_all_tabs(&mut self) -> usize {
        let removed = self.registry.close_all();
        self.after_removal(removed)
    }

    pub fn close_other_tabs(&mut self, tab_id: &TabId) -> usize {
        let removed = self.registry.close_others(tab_id);
        self.after_removal(removed)
    }

    // Session

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = SessionCodec::snapshot(&self.registry, &self.selection, &self.allocator);
        snapshot.shell_state = self.shell_state.clone();
        snapshot
    }

    /// Bring back the tabs a snapshot describes.
    ///
    /// Safe on a non-empty workspace: tabs already open are not duplicated,
    /// and their unsaved edits win over the snapshot's. Returns whether the
    /// snapshot yielded at least one tab.
    pub fn restore_session(&mut self, snapshot: &SessionSnapshot) -> bool {
        let restored = SessionCodec::restore(snapshot, &self.catalog);
        self.shell_state
            .extend(snapshot.shell_state.iter().map(|(k, v)| (k.clone(), v.clone())));

        for script in restored.placeholders.iter().cloned() {
            self.catalog.insert(script);
        }

        let mut restored_ids = Vec::with_capacity(restored.tabs.len());
        for tab in restored.tabs.iter().cloned() {
            let id = tab.id.clone();
            if self.registry.contains(&id) {
                self.merge_restored(tab);
            } else {
                self.registry.open(tab);
                self.events.emit(WorkspaceEvent::TabOpened(id.clone()));
            }
            restored_ids.push(id);
        }

        // Must run before any further temp id is issued.
        if let Some(next) = restored.next_temp_id {
            self.allocator.reconcile(next);
        }

        let requested = restored
            .active
            .clone()
            .filter(|id| self.registry.contains(id));
        let target = match requested {
            Some(id) => Some(id),
            None if self.active_tab().is_none() => restored_ids.last().cloned(),
            None => None,
        };
        if let Some(target) = target {
            self.activate(&target, true);
        }

        if !restored.skipped.is_empty() {
            warn!(
                "Querydeck: {} scripts from the last session could not be restored",
                restored.skipped.len()
            );
            self.notify(Notice::warning(format!(
                "{} script(s) from your last session no longer exist",
                restored.skipped.len()
            )));
        }

        info!("Querydeck: restored {} tabs from the last session", restored_ids.len());
        self.events.emit(WorkspaceEvent::SessionRestored {
            tabs: restored_ids.len(),
        });
        self.touch();
        restored.opened_any()
    }

    // Steps of the asynchronous commands

    pub(crate) fn prepare_save(&mut self, tab_id: &TabId) -> WorkspaceResult<SaveRequest> {
        if self.selection.is_active(tab_id) {
            self.tracker.capture_active_buffer(&mut self.registry, tab_id);
        }
        let tab = self
            .registry
            .get(tab_id)
            .ok_or_else(|| WorkspaceError::TabNotFound(tab_id.clone()))?;
        let script = tab
            .as_script()
            .ok_or_else(|| WorkspaceError::NotAScript(tab_id.clone()))?;

        Ok(SaveRequest {
            tab_id: tab_id.clone(),
            script: script.script.clone(),
            draft: ScriptDraft::from_script(&script.script, script.content.clone()),
        })
    }

    /// Apply a successful store write. If the tab changed while the write
    /// was in flight only the baseline moves and the tab stays dirty.
    pub(crate) fn complete_save(&mut self, request: SaveRequest, persisted: u64) -> ScriptId {
        let old_id = request.script.id;
        let new_id = ScriptId::Persisted(persisted);

        let mut saved = request.script;
        saved.id = new_id;
        saved.query_text = request.draft.content;
        saved.updated_at = Utc::now();

        if old_id != new_id {
            self.update_script_id(old_id, saved.clone());
        } else {
            self.catalog.insert(saved.clone());
        }

        let current = self
            .registry
            .find_script(new_id)
            .and_then(Tab::as_script)
            .map(|s| s.content.clone());
        let tab = TabId::for_script(new_id);
        match current {
            Some(content) if content == saved.query_text => {
                self.mark_script_saved(new_id, &content);
            }
            Some(_) => {
                self.tracker.rebase(&mut self.registry, new_id, &saved.query_text);
                debug!("Querydeck: {} changed while saving, keeping it dirty", tab);
                self.events.emit(WorkspaceEvent::ContentChanged {
                    tab: tab.clone(),
                    is_dirty: true,
                });
            }
            None => {}
        }

        self.notify(Notice::success(format!("Saved \"{}\"", saved.name)).for_tab(tab.as_str()));
        self.events.emit(WorkspaceEvent::ScriptSaved {
            tab,
            script_id: new_id,
        });
        self.touch();
        new_id
    }

    pub(crate) fn report_failure(&mut self, action: &str, tab_id: &TabId, error: &BackendError) {
        let title = self
            .registry
            .get(tab_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| tab_id.to_string());
        warn!("Querydeck: failed to {} {}: {}", action, title, error);
        self.notify(Notice::error(format!("Failed to {} \"{}\": {}", action, title, error)).for_tab(tab_id.as_str()));
    }

    /// Drop a deleted script from the catalog and close its tab.
    pub(crate) fn forget_script(&mut self, script_id: ScriptId) -> bool {
        self.catalog.remove(script_id);
        match self.registry.close(&TabId::for_script(script_id)) {
            Some(tab) => {
                self.after_removal(vec![tab]);
                true
            }
            None => {
                self.touch();
                false
            }
        }
    }

    /// Resolve the SQL and connection for a run and mark the tab Running.
    pub(crate) fn prepare_query(
        &mut self,
        tab_id: &TabId,
        connection_id: Option<&str>,
    ) -> WorkspaceResult<(String, String)> {
        if self.selection.is_active(tab_id) {
            self.tracker.capture_active_buffer(&mut self.registry, tab_id);
        }
        let tab = self
            .registry
            .get(tab_id)
            .ok_or_else(|| WorkspaceError::TabNotFound(tab_id.clone()))?;
        let script = tab
            .as_script()
            .ok_or_else(|| WorkspaceError::NotAScript(tab_id.clone()))?;
        let connection = connection_id
            .map(str::to_string)
            .or_else(|| script.script.connection_id.clone())
            .ok_or_else(|| WorkspaceError::NoConnection(tab_id.clone()))?;
        let sql = script.content.clone();

        self.set_query_status(tab_id, QueryStatus::Running);
        Ok((connection, sql))
    }

    // Internals

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// First of `Untitled Script`, `Untitled Script 2`, ... that no known
    /// script or open tab already uses.
    fn next_untitled_name(&self) -> String {
        let taken = |name: &str| {
            self.catalog.find_by_name(name).is_some()
                || self.registry.tabs().iter().any(|t| t.title == name)
        };
        if !taken(&self.untitled_name) {
            return self.untitled_name.clone();
        }
        let mut n = 2;
        loop {
            let name = format!("{} {}", self.untitled_name, n);
            if !taken(&name) {
                return name;
            }
            n += 1;
        }
    }

    fn create_script_with(&mut self, query_text: String) -> TabId {
        let id = self.allocator.next_id();
        let script = Script::placeholder(id, self.next_untitled_name(), query_text);
        debug!("Querydeck: created {} as {}", script.name, id);
        self.open_script(script)
    }

    fn open_and_focus(&mut self, tab: Tab) -> TabId {
        // The outgoing buffer goes home before a refresh can touch its tab.
        if let Some(active) = self.selection.active_id().cloned() {
            self.tracker.capture_active_buffer(&mut self.registry, &active);
        }

        let fresh = !self.registry.contains(&tab.id);
        let id = self.registry.open(tab);
        if fresh {
            self.events.emit(WorkspaceEvent::TabOpened(id.clone()));
        }
        self.activate(&id, true);
        self.touch();
        id
    }

    fn activate(&mut self, tab_id: &TabId, skip_flush: bool) -> bool {
        let changed = !self.selection.is_active(tab_id);
        if !self
            .selection
            .switch_to_tab(&mut self.registry, &mut self.tracker, tab_id, skip_flush)
        {
            return false;
        }
        if changed {
            self.events
                .emit(WorkspaceEvent::ActiveTabChanged(Some(tab_id.clone())));
            self.touch();
        }
        true
    }

    fn apply_content(&mut self, tab_id: &TabId, content: String) -> Option<bool> {
        let is_dirty = self
            .tracker
            .on_content_change(&mut self.registry, tab_id, content)?;
        self.events.emit(WorkspaceEvent::ContentChanged {
            tab: tab_id.clone(),
            is_dirty,
        });
        self.touch();
        Some(is_dirty)
    }

    /// A restored tab is already open. Snapshot edits only land on a clean
    /// tab so nothing typed since is lost.
    fn merge_restored(&mut self, tab: Tab) {
        let existing_clean = self.registry.get(&tab.id).map_or(false, |t| !t.is_dirty);
        if !tab.is_dirty || !existing_clean {
            return;
        }
        let Some(content) = tab.as_script().map(|s| s.content.clone()) else {
            return;
        };
        self.apply_content(&tab.id, content);
        if self.selection.is_active(&tab.id) {
            self.tracker.load_buffer_for_tab(&self.registry, &tab.id);
        }
    }

    /// Bookkeeping shared by every close path. Returns how many tabs went.
    fn after_removal(&mut self, removed: Vec<Tab>) -> usize {
        if removed.is_empty() {
            return 0;
        }
        for tab in &removed {
            // A closed never-saved script is gone for good.
            if let Some(id) = tab.script_id().filter(ScriptId::is_temporary) {
                self.catalog.remove(id);
            }
            self.events.emit(WorkspaceEvent::TabClosed(tab.id.clone()));
        }
        if self.selection.settle(&self.registry, &mut self.tracker) {
            let active = self.selection.active_id().cloned();
            self.events.emit(WorkspaceEvent::ActiveTabChanged(active));
        }
        self.touch();
        removed.len()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(&WorkspaceConfig::default())
    }
}
