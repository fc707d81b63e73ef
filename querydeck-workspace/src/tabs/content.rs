use querydeck_utils::data::ScriptId;

use super::{TabId, TabRegistry};

/// Dirty rule for script buffers.
///
/// A never-saved script is dirty as soon as it has any content; a saved one
/// is dirty while its content differs from the saved baseline.
pub fn compute_dirty(content: &str, baseline: &str, is_new_script: bool) -> bool {
    if is_new_script {
        !content.is_empty()
    } else {
        content != baseline
    }
}

/// Owns the live editor buffer and keeps script tab records in step with it.
#[derive(Debug, Clone, Default)]
pub struct DocumentContentTracker {
    live_buffer: String,
}

impl DocumentContentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content currently shown in the editor.
    pub fn live_buffer(&self) -> &str {
        &self.live_buffer
    }

    pub fn set_live_buffer(&mut self, content: impl Into<String>) {
        self.live_buffer = content.into();
    }

    pub fn clear(&mut self) {
        self.live_buffer.clear();
    }

    /// Store new content on a script tab and recompute its dirty flag.
    ///
    /// Returns the new dirty flag, or `None` if `tab_id` is not an open
    /// script tab.
    pub fn on_content_change(
        &mut self,
        registry: &mut TabRegistry,
        tab_id: &TabId,
        new_content: String,
    ) -> Option<bool> {
        let tab = registry.get_mut(tab_id)?;
        tab.as_script_mut()?.content = new_content;
        Some(tab.refresh_dirty())
    }

    /// Make `saved_content` the baseline of a script's tab and mark it clean.
    pub fn mark_saved(
        &mut self,
        registry: &mut TabRegistry,
        script_id: ScriptId,
        saved_content: &str,
    ) -> bool {
        let Some(tab) = registry.find_script_mut(script_id) else {
            return false;
        };
        if let Some(script) = tab.as_script_mut() {
            script.script.query_text = saved_content.to_string();
            script.content = saved_content.to_string();
            script.is_new_script = false;
        }
        tab.is_dirty = false;
        true
    }

    /// Move only the baseline, keeping whatever the tab holds now. Used when
    /// edits landed while a save was in flight.
    pub fn rebase(&mut self, registry: &mut TabRegistry, script_id: ScriptId, saved_content: &str) -> bool {
        let Some(tab) = registry.find_script_mut(script_id) else {
            return false;
        };
        if let Some(script) = tab.as_script_mut() {
            script.script.query_text = saved_content.to_string();
            script.is_new_script = false;
        }
        tab.refresh_dirty();
        true
    }

    /// Write the live buffer back into the outgoing tab.
    ///
    /// Only script tabs take part; for anything else this is a no-op.
    pub fn capture_active_buffer(&mut self, registry: &mut TabRegistry, tab_id: &TabId) -> bool {
        let buffer = self.live_buffer.clone();
        self.on_content_change(registry, tab_id, buffer).is_some()
    }

    /// Load a script tab's stored content into the live buffer.
    ///
    /// Returns the loaded content, or `None` (buffer untouched) when the tab
    /// is missing or not a script.
    pub fn load_buffer_for_tab(&mut self, registry: &TabRegistry, tab_id: &TabId) -> Option<&str> {
        let script = registry.get(tab_id)?.as_script()?;
        self.live_buffer = script.content.clone();
        Some(&self.live_buffer)
    }
}
