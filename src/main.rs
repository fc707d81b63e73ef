mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

use querydeck_workspace::backends::{
    FileSessionStorage, MockScriptBackend, ScriptBackend, SessionStorage,
};
use querydeck_workspace::commands::load_session;
use querydeck_workspace::persistence::PgScriptStore;
use querydeck_workspace::session::SessionPersister;
use querydeck_workspace::tabs::TabKind;
use querydeck_workspace::{shared, SharedWorkspace, Workspace, WorkspaceConfig};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging();

    let config = args.workspace_config();
    match args.command {
        Command::Path => {
            println!("{}", config.session_path().display());
            Ok(())
        }
        Command::Inspect { json } => {
            let restored = restore(&config).await;
            if !restored.store_available {
                warn!("Querydeck: script store offline, saved scripts are listed as missing");
            }
            let ws = restored.workspace.lock().await;
            if json {
                let snapshot = serde_json::to_string_pretty(&ws.snapshot())
                    .context("failed to encode the restored session")?;
                println!("{}", snapshot);
            } else {
                print!("{}", render_tabs(&ws));
            }
            Ok(())
        }
        Command::Compact => {
            let restored = restore(&config).await;
            compact(&restored.workspace, restored.storage, restored.store_available)
                .await
                .with_context(|| format!("failed to compact {}", config.session_path().display()))?;
            info!("Querydeck: session rewritten to {}", config.session_path().display());
            Ok(())
        }
    }
}

struct Restored {
    workspace: SharedWorkspace,
    storage: Arc<dyn SessionStorage>,
    store_available: bool,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Restore the session the way the application does on startup.
async fn restore(config: &WorkspaceConfig) -> Restored {
    let storage = FileSessionStorage::new(config.session_path());
    let store = PgScriptStore::connect(config.database_url.clone()).await;
    let offline = MockScriptBackend::new("offline");
    let backend: &dyn ScriptBackend = if store.is_available() { &store } else { &offline };

    let workspace = shared(Workspace::new(config));
    if !load_session(&workspace, &storage, backend).await {
        info!("Querydeck: nothing to restore from {}", storage.path().display());
    }
    Restored {
        workspace,
        storage: Arc::new(storage),
        store_available: store.is_available(),
    }
}

/// Write the restored session back. Without the script store every saved
/// script looks deleted, so writing would drop those tabs and their edits.
async fn compact(
    workspace: &SharedWorkspace,
    storage: Arc<dyn SessionStorage>,
    store_available: bool,
) -> Result<()> {
    if !store_available {
        bail!("the script store is unreachable; set --database-url to compact the session");
    }
    SessionPersister::new(storage).flush(workspace).await?;
    Ok(())
}

fn render_tabs(workspace: &Workspace) -> String {
    if workspace.tabs().is_empty() {
        return "no open tabs\n".to_string();
    }

    let mut out = String::new();
    for tab in workspace.tabs() {
        let marker = if workspace.active_tab_id() == Some(&tab.id) { '>' } else { ' ' };
        let kind = match tab.kind() {
            TabKind::Script => "script",
            TabKind::TableView => "table",
        };
        let mut flags = Vec::new();
        if tab.is_pinned {
            flags.push("pinned");
        }
        if tab.is_dirty {
            flags.push("modified");
        }
        if tab.as_script().map_or(false, |s| s.is_new_script) {
            flags.push("unsaved");
        }

        out.push_str(&format!("{} {} {} ({})", marker, kind, tab.title, tab.id));
        if !flags.is_empty() {
            out.push_str(&format!(" [{}]", flags.join(", ")));
        }
        out.push('\n');
    }
    out
}
