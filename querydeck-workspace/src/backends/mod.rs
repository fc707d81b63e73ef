// Querydeck Backends
//
// Interfaces to everything outside the tab/session core:
//
// - ScriptBackend: durable script store (save/update/remove/list)
// - SessionStorage: opaque string channel for the session snapshot
// - QueryExecutor: runs SQL, results are stored on tabs verbatim
// - ScriptResolver: synchronous lookup used while restoring a session
//
// # Architecture
//
// ```text
//      Workspace commands
//             │
//             ▼
// ┌───────────────────────┐
// │ ScriptBackend /       │  ← traits, awaited by the caller
// │ SessionStorage / ...  │
// └───────────────────────┘
//        │          │
//        ▼          ▼
//  PgScriptStore  FileSessionStorage   (production)
//  MockScriptBackend  MockSessionStorage (tests)
// ```
//
// Backend calls never run while the workspace is locked; state changes are
// applied once the call resolves, so a failure leaves the tabs as they were.

mod adapter;
mod error;
mod file;
mod mock;

pub use adapter::{QueryExecutor, ScriptBackend, ScriptDraft, ScriptResolver, SessionStorage};
pub use error::{BackendError, BackendResult};
pub use file::FileSessionStorage;
pub use mock::{MockQueryExecutor, MockScriptBackend, MockSessionStorage};
