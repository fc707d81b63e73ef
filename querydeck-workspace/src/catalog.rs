use std::collections::BTreeMap;

use querydeck_utils::data::{Script, ScriptId};

use crate::backends::ScriptResolver;

/// Every script record the workspace knows about, open or not.
///
/// Holds what the store last listed plus never-saved scripts created in this
/// session. It is also the resolver used when restoring a session.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: BTreeMap<ScriptId, Script>,
}

impl ScriptCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn get(&self, id: ScriptId) -> Option<&Script> {
        self.scripts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    pub fn insert(&mut self, script: Script) -> Option<Script> {
        self.scripts.insert(script.id, script)
    }

    pub fn remove(&mut self, id: ScriptId) -> Option<Script> {
        self.scripts.remove(&id)
    }

    pub fn rename(&mut self, id: ScriptId, name: &str) -> bool {
        match self.scripts.get_mut(&id) {
            Some(script) => {
                script.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_query_text(&mut self, id: ScriptId, query_text: &str) -> bool {
        match self.scripts.get_mut(&id) {
            Some(script) => {
                script.query_text = query_text.to_string();
                true
            }
            None => false,
        }
    }

    /// Swap in a fresh listing from the store. Never-saved scripts are kept.
    pub fn replace_persisted(&mut self, scripts: Vec<Script>) {
        self.scripts.retain(|id, _| id.is_temporary());
        for script in scripts {
            self.insert(script);
        }
    }

    /// First script carrying exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Script> {
        self.scripts.values().find(|s| s.name == name)
    }
}

impl ScriptResolver for ScriptCatalog {
    fn resolve(&self, id: ScriptId) -> Option<Script> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(id: ScriptId, name: &str) -> Script {
        Script::placeholder(id, name, "")
    }

    #[test]
    fn test_replace_persisted_keeps_temporaries() {
        let mut catalog = ScriptCatalog::new();
        catalog.insert(script(ScriptId::Persisted(1), "old"));
        catalog.insert(script(ScriptId::Temporary(-1), "Untitled Script"));

        catalog.replace_persisted(vec![script(ScriptId::Persisted(2), "new")]);

        assert!(catalog.get(ScriptId::Persisted(1)).is_none());
        assert!(catalog.get(ScriptId::Persisted(2)).is_some());
        assert!(catalog.get(ScriptId::Temporary(-1)).is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_lookup_by_name_and_id() {
        let mut catalog = ScriptCatalog::new();
        catalog.insert(script(ScriptId::Persisted(1), "Untitled Script"));
        catalog.insert(script(ScriptId::Persisted(2), "Untitled Script 2"));
        catalog.insert(script(ScriptId::Persisted(3), "orders"));

        assert_eq!(
            catalog.find_by_name("Untitled Script 2").map(|s| s.id),
            Some(ScriptId::Persisted(2))
        );
        assert!(catalog.find_by_name("Untitled Script 3").is_none());
        assert_eq!(
            catalog.find_by_name("orders").map(|s| s.id),
            Some(ScriptId::Persisted(3))
        );
        assert_eq!(catalog.resolve(ScriptId::Persisted(9)), None);
    }

    #[test]
    fn test_rename_and_set_query_text() {
        let mut catalog = ScriptCatalog::new();
        catalog.insert(script(ScriptId::Persisted(1), "a"));
        assert!(catalog.rename(ScriptId::Persisted(1), "b"));
        assert!(catalog.set_query_text(ScriptId::Persisted(1), "SELECT 1;"));
        assert!(!catalog.rename(ScriptId::Persisted(2), "b"));

        let stored = catalog.get(ScriptId::Persisted(1)).unwrap();
        assert_eq!(stored.name, "b");
        assert_eq!(stored.query_text, "SELECT 1;");
    }
}
