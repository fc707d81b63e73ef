// Querydeck Backends - Mock Implementations
//
// In-memory stand-ins for the script store, session storage and query
// executor. Tests use them to control responses, inject failures and count
// calls; the CLI uses the script mock when no database is configured.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use querydeck_utils::data::{QueryResult, Script, ScriptId};

use super::adapter::{QueryExecutor, ScriptBackend, ScriptDraft, SessionStorage};
use super::error::{BackendError, BackendResult};

/// In-memory script store.
///
/// Clones share state, so a test can hand one clone to the workspace and
/// inspect another.
#[derive(Clone)]
pub struct MockScriptBackend {
    name: String,
    scripts: Arc<Mutex<Vec<Script>>>,
    next_id: Arc<AtomicU64>,
    failure: Arc<Mutex<Option<BackendError>>>,
    save_count: Arc<AtomicUsize>,
    update_count: Arc<AtomicUsize>,
    remove_count: Arc<AtomicUsize>,
}

impl MockScriptBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scripts: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            failure: Arc::new(Mutex::new(None)),
            save_count: Arc::new(AtomicUsize::new(0)),
            update_count: Arc::new(AtomicUsize::new(0)),
            remove_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed the store. New ids continue after the highest seeded id.
    pub fn with_scripts(name: &str, scripts: Vec<Script>) -> Self {
        let mock = Self::new(name);
        let highest = scripts
            .iter()
            .filter_map(|s| s.id.as_persisted())
            .max()
            .unwrap_or(0);
        mock.next_id.store(highest + 1, Ordering::Relaxed);
        *mock.scripts.lock().unwrap() = scripts;
        mock
    }

    /// Make every following call fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<BackendError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn scripts(&self) -> Vec<Script> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::Relaxed)
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::Relaxed)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_count.load(Ordering::Relaxed)
    }

    fn check_failure(&self) -> BackendResult<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScriptBackend for MockScriptBackend {
    async fn save(&self, draft: &ScriptDraft) -> BackendResult<u64> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        self.check_failure()?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut script = Script::placeholder(ScriptId::Persisted(id), draft.name.clone(), draft.content.clone());
        script.connection_id = draft.connection_id.clone();
        script.description = draft.description.clone();
        self.scripts.lock().unwrap().push(script);
        Ok(id)
    }

    async fn update(&self, id: u64, draft: &ScriptDraft) -> BackendResult<()> {
        self.update_count.fetch_add(1, Ordering::Relaxed);
        self.check_failure()?;

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .iter_mut()
            .find(|s| s.id == ScriptId::Persisted(id))
            .ok_or(BackendError::ScriptNotFound(id))?;
        script.name = draft.name.clone();
        script.query_text = draft.content.clone();
        script.connection_id = draft.connection_id.clone();
        script.description = draft.description.clone();
        script.updated_at = Utc::now();
        Ok(())
    }

    async fn remove(&self, id: u64) -> BackendResult<()> {
        self.remove_count.fetch_add(1, Ordering::Relaxed);
        self.check_failure()?;

        let mut scripts = self.scripts.lock().unwrap();
        let before = scripts.len();
        scripts.retain(|s| s.id != ScriptId::Persisted(id));
        if scripts.len() == before {
            return Err(BackendError::ScriptNotFound(id));
        }
        Ok(())
    }

    async fn list(&self) -> BackendResult<Vec<Script>> {
        self.check_failure()?;
        Ok(self.scripts())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory session storage with an optional gate that holds saves open.
#[derive(Clone)]
pub struct MockSessionStorage {
    stored: Arc<Mutex<Option<String>>>,
    failure: Arc<Mutex<Option<BackendError>>>,
    gate: Option<Arc<Notify>>,
    saves_started: Arc<AtomicUsize>,
    save_count: Arc<AtomicUsize>,
    load_count: Arc<AtomicUsize>,
}

impl MockSessionStorage {
    pub fn new() -> Self {
        Self {
            stored: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
            gate: None,
            saves_started: Arc::new(AtomicUsize::new(0)),
            save_count: Arc::new(AtomicUsize::new(0)),
            load_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_contents(serialized: &str) -> Self {
        let storage = Self::new();
        *storage.stored.lock().unwrap() = Some(serialized.to_string());
        storage
    }

    /// Storage whose saves block until the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let storage = Self {
            gate: Some(gate.clone()),
            ..Self::new()
        };
        (storage, gate)
    }

    pub fn set_failure(&self, error: Option<BackendError>) {
        *self.failure.lock().unwrap() = error;
    }

    pub fn contents(&self) -> Option<String> {
        self.stored.lock().unwrap().clone()
    }

    /// Saves that have begun, including ones still waiting on the gate.
    pub fn saves_started(&self) -> usize {
        self.saves_started.load(Ordering::Relaxed)
    }

    /// Saves that completed successfully.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::Relaxed)
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::Relaxed)
    }
}

impl Default for MockSessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for MockSessionStorage {
    async fn load(&self) -> BackendResult<Option<String>> {
        self.load_count.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.failure.lock().unwrap().as_ref() {
            return Err(err.clone());
        }
        Ok(self.contents())
    }

    async fn save(&self, serialized: &str) -> BackendResult<()> {
        self.saves_started.fetch_add(1, Ordering::Relaxed);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(err) = self.failure.lock().unwrap().as_ref() {
            return Err(err.clone());
        }
        *self.stored.lock().unwrap() = Some(serialized.to_string());
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Query executor returning a canned response and recording what it ran.
#[derive(Clone)]
pub struct MockQueryExecutor {
    response: Arc<Mutex<BackendResult<Vec<QueryResult>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockQueryExecutor {
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(Vec::new()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_response(&self, response: BackendResult<Vec<QueryResult>>) {
        *self.response.lock().unwrap() = response;
    }

    /// `(connection_id, sql)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockQueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryExecutor for MockQueryExecutor {
    async fn execute(&self, connection_id: &str, sql: &str) -> BackendResult<Vec<QueryResult>> {
        self.calls
            .lock()
            .unwrap()
            .push((connection_id.to_string(), sql.to_string()));
        self.response.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, content: &str) -> ScriptDraft {
        ScriptDraft {
            name: name.to_string(),
            content: content.to_string(),
            connection_id: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_mock_script_save_assigns_increasing_ids() {
        let backend = MockScriptBackend::new("test");
        let first = backend.save(&draft("a", "SELECT 1;")).await.unwrap();
        let second = backend.save(&draft("b", "SELECT 2;")).await.unwrap();

        assert_eq!((first, second), (1, 2));
        assert_eq!(backend.save_count(), 2);
        assert_eq!(backend.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_script_seeded_ids_continue() {
        let backend = MockScriptBackend::with_scripts(
            "test",
            vec![Script::placeholder(ScriptId::Persisted(7), "seed", "")],
        );
        assert_eq!(backend.save(&draft("next", "")).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_mock_script_update_and_remove() {
        let backend = MockScriptBackend::new("test");
        let id = backend.save(&draft("a", "SELECT 1;")).await.unwrap();

        backend.update(id, &draft("a", "SELECT 2;")).await.unwrap();
        assert_eq!(backend.scripts()[0].query_text, "SELECT 2;");

        backend.remove(id).await.unwrap();
        assert!(matches!(backend.remove(id).await, Err(BackendError::ScriptNotFound(_))));
        assert!(matches!(
            backend.update(id, &draft("a", "")).await,
            Err(BackendError::ScriptNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_script_failure_injection() {
        let backend = MockScriptBackend::new("test");
        backend.set_failure(Some(BackendError::Unavailable("down".to_string())));

        assert!(backend.save(&draft("a", "")).await.is_err());
        assert!(backend.scripts().is_empty());

        backend.set_failure(None);
        assert!(backend.save(&draft("a", "")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_session_storage_round_trip() {
        let storage = MockSessionStorage::new();
        assert_eq!(storage.load().await.unwrap(), None);

        storage.save("{}").await.unwrap();
        assert_eq!(storage.load().await.unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.save_count(), 1);
        assert_eq!(storage.load_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_query_executor_records_calls() {
        let executor = MockQueryExecutor::new();
        executor.set_response(Ok(vec![QueryResult {
            columns: vec!["n".to_string()],
            ..Default::default()
        }]));

        let results = executor.execute("pg-local", "SELECT 1 AS n;").await.unwrap();
        assert_eq!(results[0].columns, vec!["n"]);
        assert_eq!(
            executor.calls(),
            vec![("pg-local".to_string(), "SELECT 1 AS n;".to_string())]
        );
    }
}
