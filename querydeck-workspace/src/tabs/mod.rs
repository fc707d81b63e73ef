// Querydeck Tabs
//
// Open documents and the components that keep them consistent: the ordered
// registry, the edit-buffer tracker, the active selection and the temp-id
// allocator.

mod active;
mod allocator;
mod content;
mod registry;

pub use active::ActiveSelection;
pub use allocator::TempIdAllocator;
pub use content::{compute_dirty, DocumentContentTracker};
pub use registry::TabRegistry;

use querydeck_utils::data::{QueryResult, QueryStatus, Script, ScriptId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a tab, derived from what the tab shows.
///
/// Opening the same document twice yields the same id, which is what makes
/// `open` idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(String);

impl TabId {
    pub fn for_script(id: ScriptId) -> Self {
        TabId(format!("script-{}", id))
    }

    pub fn for_table(connection_id: &str, schema: &str, table_name: &str) -> Self {
        TabId(format!("table-{}-{}-{}", connection_id, schema, table_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Script,
    TableView,
}

/// An open SQL script and its live content
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTab {
    /// Backing record; `script.query_text` is the baseline
    pub script: Script,
    pub content: String,
    pub is_new_script: bool,
    pub results: Option<Vec<QueryResult>>,
    pub error: Option<String>,
    pub query_status: QueryStatus,
}

impl ScriptTab {
    pub fn script_id(&self) -> ScriptId {
        self.script.id
    }

    pub fn baseline(&self) -> &str {
        &self.script.query_text
    }

    /// Whether the current content counts as unsaved.
    pub fn content_is_dirty(&self) -> bool {
        compute_dirty(&self.content, self.baseline(), self.is_new_script)
    }
}

/// A browse view over one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableViewTab {
    pub table_name: String,
    pub schema: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TabContent {
    Script(ScriptTab),
    TableView(TableViewTab),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub is_dirty: bool,
    pub can_close: bool,
    pub can_rename: bool,
    pub is_pinned: bool,
    pub content: TabContent,
}

impl Tab {
    /// Tab for a script, showing its saved text.
    pub fn script(script: Script) -> Self {
        let is_new_script = script.id.is_temporary();
        Self {
            id: TabId::for_script(script.id),
            title: script.name.clone(),
            is_dirty: false,
            can_close: true,
            can_rename: true,
            is_pinned: false,
            content: TabContent::Script(ScriptTab {
                content: script.query_text.clone(),
                script,
                is_new_script,
                results: None,
                error: None,
                query_status: QueryStatus::Idle,
            }),
        }
    }

    pub fn table_view(table_name: &str, schema: &str, connection_id: &str) -> Self {
        Self {
            id: TabId::for_table(connection_id, schema, table_name),
            title: format!("{}.{}", schema, table_name),
            is_dirty: false,
            can_close: true,
            can_rename: false,
            is_pinned: false,
            content: TabContent::TableView(TableViewTab {
                table_name: table_name.to_string(),
                schema: schema.to_string(),
                connection_id: connection_id.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> TabKind {
        match self.content {
            TabContent::Script(_) => TabKind::Script,
            TabContent::TableView(_) => TabKind::TableView,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptTab> {
        match &self.content {
            TabContent::Script(script) => Some(script),
            TabContent::TableView(_) => None,
        }
    }

    pub fn as_script_mut(&mut self) -> Option<&mut ScriptTab> {
        match &mut self.content {
            TabContent::Script(script) => Some(script),
            TabContent::TableView(_) => None,
        }
    }

    pub fn script_id(&self) -> Option<ScriptId> {
        self.as_script().map(ScriptTab::script_id)
    }

    /// Recompute `is_dirty` from content and baseline. Table views are never dirty.
    pub(crate) fn refresh_dirty(&mut self) -> bool {
        self.is_dirty = self.as_script().map_or(false, ScriptTab::content_is_dirty);
        self.is_dirty
    }
}

#[cfg(test)]
#[path = "./unit/lifecycle_tests.rs"]
mod lifecycle_tests;
