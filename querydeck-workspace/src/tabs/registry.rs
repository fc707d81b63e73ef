use log::{debug, warn};
use querydeck_utils::data::{Script, ScriptId};

use super::{Tab, TabContent, TabId};

/// Ordered list of open tabs.
///
/// Pinned tabs always form a prefix of the list. Every mutation either keeps
/// that true or is rejected without touching the list.
#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self { tabs: Vec::new() }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|t| t.id.clone()).collect()
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|t| &t.id == id)
    }

    pub fn get(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| &t.id == id)
    }

    pub fn last(&self) -> Option<&Tab> {
        self.tabs.last()
    }

    pub fn find_script(&self, script_id: ScriptId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.script_id() == Some(script_id))
    }

    pub fn find_script_mut(&mut self, script_id: ScriptId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.script_id() == Some(script_id))
    }

    pub fn pinned_count(&self) -> usize {
        self.tabs.iter().take_while(|t| t.is_pinned).count()
    }

    /// Check the pin-prefix invariant.
    pub fn pinned_form_prefix(&self) -> bool {
        let pinned = self.pinned_count();
        self.tabs[pinned..].iter().all(|t| !t.is_pinned)
    }

    /// Open a tab, or refresh the existing one with the same id.
    ///
    /// A refreshed script tab takes the new backing record; its buffer is
    /// only replaced when it holds no unsaved edits.
    pub fn open(&mut self, tab: Tab) -> TabId {
        if let Some(existing) = self.get_mut(&tab.id) {
            if let (TabContent::Script(current), TabContent::Script(incoming)) =
                (&mut existing.content, tab.content)
            {
                let keep_edits = existing.is_dirty;
                if !keep_edits {
                    current.content = incoming.script.query_text.clone();
                }
                existing.title = incoming.script.name.clone();
                current.script = incoming.script;
                existing.refresh_dirty();
            }
            debug!("Querydeck: refocused existing tab {}", existing.id);
            return existing.id.clone();
        }

        let id = tab.id.clone();
        if tab.is_pinned {
            let at = self.pinned_count();
            self.tabs.insert(at, tab);
        } else {
            self.tabs.push(tab);
        }
        id
    }

    /// Remove a single tab. Tabs that cannot be closed are left in place.
    pub fn close(&mut self, id: &TabId) -> Option<Tab> {
        let index = self.position(id)?;
        if !self.tabs[index].can_close {
            return None;
        }
        Some(self.tabs.remove(index))
    }

    /// Move a tab to the end of the pinned prefix. Returns false when the
    /// tab is missing or already pinned.
    pub fn pin(&mut self, id: &TabId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.tabs[index].is_pinned {
            return false;
        }
        let mut tab = self.tabs.remove(index);
        tab.is_pinned = true;
        let at = self.pinned_count();
        self.tabs.insert(at, tab);
        true
    }

    /// Move a tab to the start of the unpinned suffix. Returns false when
    /// the tab is missing or not pinned.
    pub fn unpin(&mut self, id: &TabId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if !self.tabs[index].is_pinned {
            return false;
        }
        let mut tab = self.tabs.remove(index);
        tab.is_pinned = false;
        let at = self.pinned_count();
        self.tabs.insert(at, tab);
        true
    }

    /// Move the tab at `from` to `to`.
    ///
    /// Rejected when either index is out of range, when they are equal, or
    /// when the move would carry a tab across the pinned boundary.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.tabs.len();
        if from == to || from >= len || to >= len {
            return false;
        }

        let pinned = self.pinned_count();
        let allowed = if self.tabs[from].is_pinned {
            to < pinned
        } else {
            to >= pinned
        };
        if !allowed {
            debug!(
                "Querydeck: rejected reorder {} -> {} across pinned boundary ({} pinned)",
                from, to, pinned
            );
            return false;
        }

        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        true
    }

    /// Close every unpinned tab left of `id`. Returns the removed tabs.
    pub fn close_to_left(&mut self, id: &TabId) -> Vec<Tab> {
        match self.position(id) {
            Some(anchor) => self.remove_where(|index, _| index < anchor),
            None => Vec::new(),
        }
    }

    /// Close every unpinned tab right of `id`. Returns the removed tabs.
    pub fn close_to_right(&mut self, id: &TabId) -> Vec<Tab> {
        match self.position(id) {
            Some(anchor) => self.remove_where(|index, _| index > anchor),
            None => Vec::new(),
        }
    }

    /// Close every unpinned tab.
    pub fn close_all(&mut self) -> Vec<Tab> {
        self.remove_where(|_, _| true)
    }

    /// Close every unpinned tab except `id`.
    pub fn close_others(&mut self, id: &TabId) -> Vec<Tab> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.remove_where(|_, tab| &tab.id != id)
    }

    /// Give the tab of a temporary script its persisted identity.
    ///
    /// Returns the old and new tab ids. A stale tab already holding the new
    /// id is dropped in favor of the remapped one, which carries the edits.
    pub fn rekey_script(&mut self, old: ScriptId, saved: Script) -> Option<(TabId, TabId)> {
        let old_id = TabId::for_script(old);
        let new_id = TabId::for_script(saved.id);
        self.position(&old_id)?;

        if old_id != new_id {
            if let Some(stale) = self.position(&new_id) {
                warn!(
                    "Querydeck: tab {} already open while remapping {}; dropping the stale copy",
                    new_id, old_id
                );
                self.tabs.remove(stale);
            }
        }

        let tab = self.get_mut(&old_id)?;
        tab.id = new_id.clone();
        tab.title = saved.name.clone();
        if let Some(script) = tab.as_script_mut() {
            script.is_new_script = saved.id.is_temporary();
            script.script = saved;
        }
        tab.refresh_dirty();
        Some((old_id, new_id))
    }

    /// Remove tabs matching `doomed`, always sparing pinned and uncloseable
    /// tabs.
    fn remove_where(&mut self, doomed: impl Fn(usize, &Tab) -> bool) -> Vec<Tab> {
        let mut kept = Vec::with_capacity(self.tabs.len());
        let mut removed = Vec::new();
        for (index, tab) in std::mem::take(&mut self.tabs).into_iter().enumerate() {
            if !tab.is_pinned && tab.can_close && doomed(index, &tab) {
                removed.push(tab);
            } else {
                kept.push(tab);
            }
        }
        self.tabs = kept;
        removed
    }
}
