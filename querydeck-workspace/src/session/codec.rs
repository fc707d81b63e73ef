// Querydeck Session Codec
//
// Converts between the live tab state and the persisted SessionSnapshot.
// Restoring is split in two: `restore` works out which tabs to open from a
// snapshot and a resolver without touching any state, and the workspace
// applies the result.

use log::warn;
use std::collections::{BTreeMap, HashSet};

use querydeck_utils::data::{Script, ScriptId};
use querydeck_utils::session::{SessionSnapshot, TempScript};

use super::error::{SessionError, SessionResult};
use crate::backends::ScriptResolver;
use crate::tabs::{ActiveSelection, ScriptTab, Tab, TabId, TabRegistry, TempIdAllocator};

/// Tabs and bookkeeping recovered from a snapshot, ready to be applied
#[derive(Debug, Clone, Default)]
pub struct RestoredSession {
    /// Script tabs in snapshot order, with restored content and dirty flags
    pub tabs: Vec<Tab>,
    /// Tab the snapshot had focused, if it named one
    pub active: Option<TabId>,
    /// Records synthesized for never-saved scripts the resolver did not know
    pub placeholders: Vec<Script>,
    /// Open ids that could not be resolved (deleted since the snapshot)
    pub skipped: Vec<ScriptId>,
    /// Counter value the temp-id allocator must not rise above
    pub next_temp_id: Option<i64>,
}

impl RestoredSession {
    pub fn opened_any(&self) -> bool {
        !self.tabs.is_empty()
    }
}

pub struct SessionCodec;

impl SessionCodec {
    /// Capture the script tabs of the workspace.
    ///
    /// Table views are not part of the snapshot. Buffers of saved scripts are
    /// only recorded when they differ from the baseline.
    pub fn snapshot(
        registry: &TabRegistry,
        selection: &ActiveSelection,
        allocator: &TempIdAllocator,
    ) -> SessionSnapshot {
        let scripts: Vec<&ScriptTab> = registry.tabs().iter().filter_map(Tab::as_script).collect();

        let temp_scripts = scripts
            .iter()
            .filter_map(|s| {
                s.script_id().as_temporary().map(|id| TempScript {
                    id,
                    name: s.script.name.clone(),
                    content: s.content.clone(),
                })
            })
            .collect();

        let unsaved_changes = scripts
            .iter()
            .filter(|s| !s.is_new_script && s.content != s.script.query_text)
            .filter_map(|s| {
                s.script_id()
                    .as_persisted()
                    .map(|id| (id.to_string(), s.content.clone()))
            })
            .collect();

        SessionSnapshot {
            next_temp_id: Some(allocator.peek()),
            temp_scripts,
            open_script_ids: scripts.iter().map(|s| s.script_id()).collect(),
            active_script_id: selection.get_active(registry).and_then(Tab::script_id),
            unsaved_changes,
            shell_state: Default::default(),
        }
    }

    /// Work out the tabs a snapshot describes.
    ///
    /// Never-saved scripts come back from `tempScripts` (synthesized when
    /// the resolver does not know them). Saved scripts are looked up through
    /// `resolver`; ids it cannot find are skipped. Saved scripts with an
    /// entry in `unsavedChanges` get that content and are forced dirty.
    pub fn restore(snapshot: &SessionSnapshot, resolver: &dyn ScriptResolver) -> RestoredSession {
        let mut restored = RestoredSession::default();
        let mut temp_scripts: BTreeMap<ScriptId, (Script, String)> = BTreeMap::new();

        for temp in &snapshot.temp_scripts {
            let id = ScriptId::from_raw(temp.id);
            if !id.is_temporary() {
                warn!("Querydeck: ignoring temp script entry with non-temporary id {}", temp.id);
                continue;
            }
            let script = match resolver.resolve(id) {
                Some(known) => known,
                None => {
                    let placeholder = Script::placeholder(id, temp.name.clone(), temp.content.clone());
                    restored.placeholders.push(placeholder.clone());
                    placeholder
                }
            };
            temp_scripts.insert(id, (script, temp.content.clone()));
        }

        let mut seen = HashSet::new();
        for &id in &snapshot.open_script_ids {
            if !seen.insert(id) {
                continue;
            }

            if let Some((script, content)) = temp_scripts.get(&id) {
                let mut tab = Tab::script(script.clone());
                if let Some(state) = tab.as_script_mut() {
                    state.content = content.clone();
                    state.is_new_script = true;
                }
                tab.refresh_dirty();
                restored.tabs.push(tab);
                continue;
            }

            let Some(script) = resolver.resolve(id) else {
                warn!("Querydeck: script {} from the last session no longer exists, skipping", id);
                restored.skipped.push(id);
                continue;
            };

            let mut tab = Tab::script(script);
            let unsaved = id.as_persisted().and_then(|pid| snapshot.unsaved_change(pid));
            if let Some(content) = unsaved {
                if let Some(state) = tab.as_script_mut() {
                    state.content = content.to_string();
                }
                tab.is_dirty = true;
            }
            restored.tabs.push(tab);
        }

        restored.active = snapshot.active_script_id.map(TabId::for_script);
        restored.next_temp_id = match (snapshot.next_temp_id, snapshot.lowest_temp_id()) {
            (Some(next), Some(lowest)) => Some(next.min(lowest - 1)),
            (Some(next), None) => Some(next),
            (None, Some(lowest)) => Some(lowest - 1),
            (None, None) => None,
        };
        restored
    }

    pub fn encode(snapshot: &SessionSnapshot) -> SessionResult<String> {
        serde_json::to_string(snapshot).map_err(|e| SessionError::Encode(e.to_string()))
    }

    pub fn decode(raw: &str) -> SessionResult<SessionSnapshot> {
        serde_json::from_str(raw).map_err(|e| SessionError::Malformed(e.to_string()))
    }

    /// Decode stored session text, treating garbage as no session at all.
    pub fn decode_or_none(raw: Option<&str>) -> Option<SessionSnapshot> {
        let raw = raw?;
        if raw.trim().is_empty() {
            return None;
        }
        match Self::decode(raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Querydeck: {}; starting with an empty workspace", e);
                None
            }
        }
    }
}
