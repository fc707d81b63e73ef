// Querydeck Session Autosave
//
// Periodically writes the session snapshot to storage. At most one write is
// in flight: a tick that finds a write still pending skips its turn instead
// of queueing behind it. Shutdown stops the ticker and then performs one
// last write that waits for any pending one.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use querydeck_utils::session::SessionSnapshot;

use super::codec::SessionCodec;
use super::error::SessionResult;
use crate::backends::SessionStorage;
use crate::commands::SharedWorkspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Snapshot written
    Saved,
    /// Another write was still in flight
    Skipped,
    /// Nothing changed since the last write
    Unchanged,
}

/// Writes workspace snapshots to session storage, one at a time.
#[derive(Clone)]
pub struct SessionPersister {
    storage: Arc<dyn SessionStorage>,
    write_lock: Arc<Mutex<()>>,
}

impl SessionPersister {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Write the snapshot unless a write is already running or the
    /// workspace has not changed since the last one.
    pub async fn save_if_idle(&self, workspace: &SharedWorkspace) -> SessionResult<SaveOutcome> {
        let Ok(_guard) = self.write_lock.try_lock() else {
            debug!("Querydeck: session write still in flight, skipping");
            return Ok(SaveOutcome::Skipped);
        };

        let (snapshot, revision) = {
            let ws = workspace.lock().await;
            if !ws.needs_session_save() {
                return Ok(SaveOutcome::Unchanged);
            }
            (ws.snapshot(), ws.revision())
        };

        self.write(workspace, &snapshot, revision).await?;
        Ok(SaveOutcome::Saved)
    }

    /// Wait for any pending write, then write the current state regardless
    /// of whether it changed.
    pub async fn flush(&self, workspace: &SharedWorkspace) -> SessionResult<()> {
        let _guard = self.write_lock.lock().await;
        let (snapshot, revision) = {
            let ws = workspace.lock().await;
            (ws.snapshot(), ws.revision())
        };
        self.write(workspace, &snapshot, revision).await
    }

    async fn write(
        &self,
        workspace: &SharedWorkspace,
        snapshot: &SessionSnapshot,
        revision: u64,
    ) -> SessionResult<()> {
        let serialized = SessionCodec::encode(snapshot)?;
        self.storage.save(&serialized).await?;
        workspace.lock().await.mark_session_saved(revision);
        debug!(
            "Querydeck: session saved ({} tabs, revision {})",
            snapshot.open_script_ids.len(),
            revision
        );
        Ok(())
    }
}

/// Background ticker driving a [`SessionPersister`].
///
/// Dropping it without calling [`AutosaveTask::shutdown`] aborts the ticker
/// and skips the final write.
pub struct AutosaveTask {
    workspace: SharedWorkspace,
    persister: SessionPersister,
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AutosaveTask {
    /// Start ticking every `interval`. The first write happens one interval
    /// after spawning. Must be called inside a tokio runtime.
    pub fn spawn(workspace: SharedWorkspace, persister: SessionPersister, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let ticker_workspace = workspace.clone();
        let ticker_persister = persister.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let workspace = ticker_workspace.clone();
                        let persister = ticker_persister.clone();
                        tokio::spawn(async move {
                            match persister.save_if_idle(&workspace).await {
                                Ok(SaveOutcome::Saved) | Ok(SaveOutcome::Unchanged) => {}
                                Ok(SaveOutcome::Skipped) => {
                                    debug!("Querydeck: autosave tick skipped");
                                }
                                Err(e) => warn!("Querydeck: autosave failed: {}", e),
                            }
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        info!("Querydeck: autosave every {}s", interval.as_secs_f64());
        Self {
            workspace,
            persister,
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Stop ticking and write the session one final time.
    pub async fn shutdown(mut self) -> SessionResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Querydeck: autosave ticker ended abnormally: {}", e);
            }
        }
        info!("Querydeck: autosave stopped, writing final session");
        self.persister.flush(&self.workspace).await
    }
}

impl Drop for AutosaveTask {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
