// Querydeck Session
//
// Snapshot encoding and restore, plus the autosave task that keeps session
// storage current.

mod autosave;
mod codec;
mod error;

pub use autosave::{AutosaveTask, SaveOutcome, SessionPersister};
pub use codec::{RestoredSession, SessionCodec};
pub use error::{SessionError, SessionResult};
