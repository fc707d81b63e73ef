//! Tab and session lifecycle for the Querydeck database explorer.
//!
//! [`Workspace`] owns the open tabs, their edit buffers and the focused
//! tab. Views drive it through command methods and observe it through
//! [`events::EventBus`] listeners. The [`commands`] module adds the
//! operations that round-trip through a script store or query engine, and
//! [`session`] persists and resurrects the workspace across restarts.

pub mod backends;
pub mod catalog;
pub mod commands;
pub mod config;
mod error;
pub mod events;
pub mod persistence;
pub mod session;
pub mod tabs;
mod workspace;

pub use catalog::ScriptCatalog;
pub use commands::{shared, SharedWorkspace};
pub use config::WorkspaceConfig;
pub use error::{WorkspaceError, WorkspaceResult};
pub use workspace::Workspace;
