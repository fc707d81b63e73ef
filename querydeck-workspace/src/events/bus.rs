// Querydeck Event Bus
//
// Views register listeners here instead of polling the workspace. Events are
// delivered synchronously, in registration order, right after the mutation
// that caused them.

use std::collections::BTreeMap;

use querydeck_utils::data::{QueryStatus, ScriptId};
use querydeck_utils::notice::Notice;

use crate::tabs::TabId;

/// Something observable happened to the workspace
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    TabOpened(TabId),
    TabClosed(TabId),
    ActiveTabChanged(Option<TabId>),
    ContentChanged { tab: TabId, is_dirty: bool },
    TabsReordered,
    TabPinned { tab: TabId, pinned: bool },
    TabRenamed { tab: TabId, title: String },
    ScriptSaved { tab: TabId, script_id: ScriptId },
    ScriptIdRemapped { from: TabId, to: TabId },
    QueryStatusChanged { tab: TabId, status: QueryStatus },
    SessionRestored { tabs: usize },
    Notice(Notice),
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&WorkspaceEvent) + Send>;

/// Listener registry for workspace events
pub struct EventBus {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: BTreeMap::new(),
        }
    }

    /// Register a listener. It stays registered until unsubscribed.
    pub fn subscribe(&mut self, listener: impl FnMut(&WorkspaceEvent) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn emit(&mut self, event: WorkspaceEvent) {
        for listener in self.listeners.values_mut() {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(bus: &mut EventBus) -> (ListenerId, Arc<Mutex<Vec<WorkspaceEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        (id, seen)
    }

    #[test]
    fn test_listeners_receive_events() {
        let mut bus = EventBus::new();
        let (_, seen) = recorder(&mut bus);

        bus.emit(WorkspaceEvent::TabsReordered);
        bus.emit(WorkspaceEvent::ActiveTabChanged(None));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![WorkspaceEvent::TabsReordered, WorkspaceEvent::ActiveTabChanged(None)]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let (id, seen) = recorder(&mut bus);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(WorkspaceEvent::TabsReordered);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_multiple_listeners_each_get_a_copy() {
        let mut bus = EventBus::new();
        let (_, first) = recorder(&mut bus);
        let (_, second) = recorder(&mut bus);

        bus.emit(WorkspaceEvent::SessionRestored { tabs: 2 });

        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 1);
    }
}
