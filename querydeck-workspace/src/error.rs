use thiserror::Error;

use crate::backends::BackendError;
use crate::session::SessionError;
use crate::tabs::TabId;

/// Failures of the asynchronous workspace commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkspaceError {
    #[error("tab {0} is not open")]
    TabNotFound(TabId),

    #[error("tab {0} does not hold a script")]
    NotAScript(TabId),

    #[error("no connection selected for tab {0}")]
    NoConnection(TabId),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;
