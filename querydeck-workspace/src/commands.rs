// Querydeck Async Commands
//
// Commands that need a collaborator round trip. Each one takes the
// workspace lock to prepare, releases it for the backend await, and takes
// it again to apply the outcome, so a slow store never blocks the editor
// and a failed call leaves the tabs as they were.

use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use querydeck_utils::data::{QueryStatus, ScriptId};
use querydeck_utils::notice::Notice;

use crate::backends::{QueryExecutor, ScriptBackend, SessionStorage};
use crate::error::WorkspaceResult;
use crate::session::SessionCodec;
use crate::tabs::TabId;
use crate::workspace::Workspace;

/// Workspace shared between the UI thread and background tasks
pub type SharedWorkspace = Arc<Mutex<Workspace>>;

pub fn shared(workspace: Workspace) -> SharedWorkspace {
    Arc::new(Mutex::new(workspace))
}

/// Save the script in `tab_id` to the store.
///
/// Never-saved scripts are created and take on the issued id; saved ones
/// are updated in place. Returns the script's persisted id.
pub async fn save_script(
    workspace: &SharedWorkspace,
    tab_id: &TabId,
    backend: &dyn ScriptBackend,
) -> WorkspaceResult<ScriptId> {
    let request = workspace.lock().await.prepare_save(tab_id)?;
    debug!(
        "Querydeck: saving {} through {}",
        request.script.id,
        backend.name()
    );

    let outcome = match request.script.id {
        ScriptId::Temporary(_) => backend.save(&request.draft).await,
        ScriptId::Persisted(id) => backend.update(id, &request.draft).await.map(|()| id),
    };

    let mut ws = workspace.lock().await;
    match outcome {
        Ok(persisted) => Ok(ws.complete_save(request, persisted)),
        Err(e) => {
            ws.report_failure("save", &request.tab_id, &e);
            Err(e.into())
        }
    }
}

/// Delete a script from the store and close its tab.
///
/// Never-saved scripts have nothing in the store and are only closed.
pub async fn delete_script(
    workspace: &SharedWorkspace,
    script_id: ScriptId,
    backend: &dyn ScriptBackend,
) -> WorkspaceResult<()> {
    if let Some(id) = script_id.as_persisted() {
        if let Err(e) = backend.remove(id).await {
            workspace
                .lock()
                .await
                .report_failure("delete", &TabId::for_script(script_id), &e);
            return Err(e.into());
        }
    }

    workspace.lock().await.forget_script(script_id);
    Ok(())
}

/// Run the content of a script tab and store the output on it.
///
/// `connection_id` overrides the script's own connection. Execution errors
/// are stored on the tab and reported through the returned status; only a
/// missing tab or connection is an `Err`.
pub async fn run_query(
    workspace: &SharedWorkspace,
    tab_id: &TabId,
    connection_id: Option<&str>,
    executor: &dyn QueryExecutor,
) -> WorkspaceResult<QueryStatus> {
    let (connection, sql) = workspace.lock().await.prepare_query(tab_id, connection_id)?;

    let outcome = executor.execute(&connection, &sql).await;

    let mut ws = workspace.lock().await;
    match outcome {
        Ok(results) => {
            ws.set_query_results(tab_id, results);
            Ok(QueryStatus::Completed)
        }
        Err(e) => {
            warn!("Querydeck: query on {} failed: {}", connection, e);
            ws.set_query_error(tab_id, e.to_string());
            Ok(QueryStatus::Error)
        }
    }
}

/// Startup path: refresh the catalog from the store, then restore the last
/// session from storage.
///
/// Store and storage failures degrade to an empty catalog or no session;
/// they are surfaced as notices, not errors. Returns whether any tab was
/// restored.
pub async fn load_session(
    workspace: &SharedWorkspace,
    storage: &dyn SessionStorage,
    backend: &dyn ScriptBackend,
) -> bool {
    match backend.list().await {
        Ok(scripts) => workspace.lock().await.set_scripts(scripts),
        Err(e) => {
            warn!("Querydeck: could not list scripts from {}: {}", backend.name(), e);
            workspace
                .lock()
                .await
                .notify(Notice::warning(format!("Saved scripts unavailable: {}", e)));
        }
    }

    let raw = match storage.load().await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Querydeck: could not load the last session: {}", e);
            None
        }
    };

    let Some(snapshot) = SessionCodec::decode_or_none(raw.as_deref()) else {
        return false;
    };
    workspace.lock().await.restore_session(&snapshot)
}
