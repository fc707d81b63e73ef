// Querydeck Backends - Collaborator Traits
//
// The workspace never talks to a database, a disk or a query engine
// directly. It goes through these traits so the storage medium can change
// and tests can substitute mocks.

use async_trait::async_trait;
use querydeck_utils::data::{QueryResult, Script, ScriptId};

use super::error::BackendResult;

/// Fields sent to the script store on save or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDraft {
    pub name: String,
    pub content: String,
    pub connection_id: Option<String>,
    pub description: Option<String>,
}

impl ScriptDraft {
    /// Draft from a script record with `content` as the text to store.
    pub fn from_script(script: &Script, content: impl Into<String>) -> Self {
        Self {
            name: script.name.clone(),
            content: content.into(),
            connection_id: script.connection_id.clone(),
            description: script.description.clone(),
        }
    }
}

/// Durable store for scripts.
///
/// Ids returned by `save` are always persisted ids; implementations must
/// reject anything else with `BackendError::InvalidScriptId`.
#[async_trait]
pub trait ScriptBackend: Send + Sync {
    /// Store a new script and return its id.
    async fn save(&self, draft: &ScriptDraft) -> BackendResult<u64>;

    /// Overwrite an existing script.
    async fn update(&self, id: u64, draft: &ScriptDraft) -> BackendResult<()>;

    async fn remove(&self, id: u64) -> BackendResult<()>;

    /// Every stored script. Used as the resolver when restoring a session.
    async fn list(&self) -> BackendResult<Vec<Script>>;

    /// Name used in logs and notices.
    fn name(&self) -> &str;
}

/// Opaque channel for the serialized session snapshot
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// The last saved snapshot, or `None` if nothing was ever saved.
    async fn load(&self) -> BackendResult<Option<String>>;

    async fn save(&self, serialized: &str) -> BackendResult<()>;
}

/// Runs SQL against a connection. Results are stored on tabs unread.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, connection_id: &str, sql: &str) -> BackendResult<Vec<QueryResult>>;
}

/// Synchronous lookup of script records during session restore.
pub trait ScriptResolver {
    fn resolve(&self, id: ScriptId) -> Option<Script>;
}

impl ScriptResolver for [Script] {
    fn resolve(&self, id: ScriptId) -> Option<Script> {
        self.iter().find(|s| s.id == id).cloned()
    }
}

impl ScriptResolver for Vec<Script> {
    fn resolve(&self, id: ScriptId) -> Option<Script> {
        self.as_slice().resolve(id)
    }
}
