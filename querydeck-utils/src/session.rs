// Querydeck Session Snapshot
//
// The persisted shape of the open-tab workspace. Field names are camelCase
// on the wire; unknown top-level keys written by the UI shell (selected
// connection, sidebar state, ...) are carried through untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::ScriptId;

/// A script that was open but never saved to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempScript {
    pub id: i64,
    pub name: String,
    pub content: String,
}

/// Serializable workspace state used to resurrect tabs across restarts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub next_temp_id: Option<i64>,
    pub temp_scripts: Vec<TempScript>,
    pub open_script_ids: Vec<ScriptId>,
    pub active_script_id: Option<ScriptId>,
    /// Persisted script id (as a decimal string) -> buffer, only where the
    /// buffer differs from the saved baseline
    pub unsaved_changes: BTreeMap<String, String>,
    #[serde(flatten)]
    pub shell_state: serde_json::Map<String, serde_json::Value>,
}

impl SessionSnapshot {
    /// True when restoring this snapshot could not open anything.
    pub fn is_empty(&self) -> bool {
        self.open_script_ids.is_empty()
    }

    /// Unsaved buffer recorded for a persisted script, if any.
    pub fn unsaved_change(&self, id: u64) -> Option<&str> {
        self.unsaved_changes.get(&id.to_string()).map(String::as_str)
    }

    /// Smallest temp id referenced anywhere in the snapshot.
    pub fn lowest_temp_id(&self) -> Option<i64> {
        let from_temps = self.temp_scripts.iter().map(|t| t.id);
        let from_open = self
            .open_script_ids
            .iter()
            .filter_map(ScriptId::as_temporary);
        from_temps.chain(from_open).min()
    }
}
