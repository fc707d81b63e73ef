use log::debug;

use super::{DocumentContentTracker, Tab, TabId, TabRegistry};

/// Which tab has focus.
///
/// Holds no id when the registry is empty and otherwise always names a tab
/// in the registry, as long as callers route closes through
/// [`ActiveSelection::settle`].
#[derive(Debug, Clone, Default)]
pub struct ActiveSelection {
    active: Option<TabId>,
}

impl ActiveSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_id(&self) -> Option<&TabId> {
        self.active.as_ref()
    }

    pub fn is_active(&self, id: &TabId) -> bool {
        self.active.as_ref() == Some(id)
    }

    pub fn get_active<'a>(&self, registry: &'a TabRegistry) -> Option<&'a Tab> {
        registry.get(self.active.as_ref()?)
    }

    /// Focus `tab_id`, handing the edit buffer over.
    ///
    /// Unless `skip_flush` is set, the outgoing script tab first receives
    /// the live buffer. The incoming script tab's content is then loaded
    /// into the buffer. Returns false if `tab_id` is not open.
    pub fn switch_to_tab(
        &mut self,
        registry: &mut TabRegistry,
        tracker: &mut DocumentContentTracker,
        tab_id: &TabId,
        skip_flush: bool,
    ) -> bool {
        if !registry.contains(tab_id) {
            return false;
        }

        if !skip_flush {
            if let Some(outgoing) = self.active.as_ref() {
                tracker.capture_active_buffer(registry, outgoing);
            }
        }

        self.active = Some(tab_id.clone());
        tracker.load_buffer_for_tab(registry, tab_id);
        debug!("Querydeck: active tab is now {}", tab_id);
        true
    }

    /// Re-establish the active-id invariant after tabs were removed.
    ///
    /// Keeps the current tab if it survived; otherwise focuses the last tab
    /// left, or clears both the id and the edit buffer when none remain.
    /// Returns true when the active id changed.
    pub fn settle(&mut self, registry: &TabRegistry, tracker: &mut DocumentContentTracker) -> bool {
        if let Some(current) = self.active.as_ref() {
            if registry.contains(current) {
                return false;
            }
        }

        match registry.last() {
            Some(last) => {
                let last_id = last.id.clone();
                let changed = self.active.as_ref() != Some(&last_id);
                tracker.load_buffer_for_tab(registry, &last_id);
                self.active = Some(last_id);
                changed
            }
            None => {
                tracker.clear();
                self.active.take().is_some()
            }
        }
    }

    /// Point the selection at a renamed tab id.
    pub fn follow_rename(&mut self, old: &TabId, new: &TabId) -> bool {
        if self.is_active(old) {
            self.active = Some(new.clone());
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self, tracker: &mut DocumentContentTracker) {
        self.active = None;
        tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querydeck_utils::data::{Script, ScriptId};

    fn setup() -> (TabRegistry, DocumentContentTracker, TabId, TabId) {
        let mut registry = TabRegistry::new();
        let a = registry.open(Tab::script(Script::placeholder(ScriptId::Persisted(1), "a", "SELECT 'a';")));
        let b = registry.open(Tab::script(Script::placeholder(ScriptId::Persisted(2), "b", "SELECT 'b';")));
        (registry, DocumentContentTracker::new(), a, b)
    }

    #[test]
    fn test_switch_flushes_outgoing_buffer() {
        let (mut registry, mut tracker, a, b) = setup();
        let mut selection = ActiveSelection::new();

        assert!(selection.switch_to_tab(&mut registry, &mut tracker, &a, false));
        tracker.set_live_buffer("SELECT 'edited';");
        assert!(selection.switch_to_tab(&mut registry, &mut tracker, &b, false));

        assert_eq!(registry.get(&a).unwrap().as_script().unwrap().content, "SELECT 'edited';");
        assert!(registry.get(&a).unwrap().is_dirty);
        assert_eq!(tracker.live_buffer(), "SELECT 'b';");
    }

    #[test]
    fn test_switch_with_skip_flush_leaves_outgoing_alone() {
        let (mut registry, mut tracker, a, b) = setup();
        let mut selection = ActiveSelection::new();

        selection.switch_to_tab(&mut registry, &mut tracker, &a, false);
        tracker.set_live_buffer("SELECT 'scratch';");
        selection.switch_to_tab(&mut registry, &mut tracker, &b, true);

        assert_eq!(registry.get(&a).unwrap().as_script().unwrap().content, "SELECT 'a';");
    }

    #[test]
    fn test_switch_to_missing_tab_is_rejected() {
        let (mut registry, mut tracker, a, _) = setup();
        let mut selection = ActiveSelection::new();
        selection.switch_to_tab(&mut registry, &mut tracker, &a, false);

        let missing = TabId::for_script(ScriptId::Persisted(99));
        assert!(!selection.switch_to_tab(&mut registry, &mut tracker, &missing, false));
        assert_eq!(selection.active_id(), Some(&a));
    }

    #[test]
    fn test_table_view_keeps_buffer() {
        let (mut registry, mut tracker, a, _) = setup();
        let table = registry.open(Tab::table_view("users", "public", "pg"));
        let mut selection = ActiveSelection::new();

        selection.switch_to_tab(&mut registry, &mut tracker, &a, false);
        selection.switch_to_tab(&mut registry, &mut tracker, &table, false);
        assert_eq!(tracker.live_buffer(), "SELECT 'a';");
        assert_eq!(selection.get_active(&registry).unwrap().title, "public.users");
    }

    #[test]
    fn test_settle_falls_back_to_last_tab() {
        let (mut registry, mut tracker, a, b) = setup();
        let mut selection = ActiveSelection::new();
        selection.switch_to_tab(&mut registry, &mut tracker, &a, false);

        registry.close(&a);
        assert!(selection.settle(&registry, &mut tracker));
        assert_eq!(selection.active_id(), Some(&b));
        assert_eq!(tracker.live_buffer(), "SELECT 'b';");
    }

    #[test]
    fn test_settle_clears_when_empty() {
        let (mut registry, mut tracker, a, b) = setup();
        let mut selection = ActiveSelection::new();
        selection.switch_to_tab(&mut registry, &mut tracker, &b, false);

        registry.close(&a);
        registry.close(&b);
        assert!(selection.settle(&registry, &mut tracker));
        assert_eq!(selection.active_id(), None);
        assert_eq!(tracker.live_buffer(), "");
    }
}
