use clap::{Parser, Subcommand};
use std::path::PathBuf;

use querydeck_workspace::WorkspaceConfig;

#[derive(Parser, Debug)]
#[clap(name = "querydeck", version, about = "Inspect and maintain Querydeck workspace sessions")]
pub struct CliArgs {
    /// Session file to use instead of the one in the config directory
    #[clap(long, global = true, value_parser, env = "QUERYDECK_SESSION_PATH")]
    pub session: Option<PathBuf>,

    /// PostgreSQL script store; without it only never-saved scripts restore
    #[clap(long, global = true, value_parser, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Restore the last session and list its tabs
    Inspect {
        /// Print the normalized session snapshot as JSON
        #[clap(long)]
        json: bool,
    },
    /// Restore the last session and write it back without missing scripts
    Compact,
    /// Print the session file location
    Path,
}

impl CliArgs {
    /// Environment defaults overridden by flags.
    pub fn workspace_config(&self) -> WorkspaceConfig {
        let mut config = WorkspaceConfig::from_env();
        if let Some(path) = &self.session {
            config.session_path = Some(path.clone());
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        config
    }
}
