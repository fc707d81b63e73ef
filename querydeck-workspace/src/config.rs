use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::backends::FileSessionStorage;

pub const ENV_SESSION_PATH: &str = "QUERYDECK_SESSION_PATH";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_AUTOSAVE_SECS: &str = "QUERYDECK_AUTOSAVE_SECS";

/// Workspace behavior and where its collaborators live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Seconds between autosave ticks
    pub autosave_interval_secs: u64,

    /// Base name of freshly created scripts
    pub untitled_name: String,

    /// Session file location; the per-user config dir when unset
    pub session_path: Option<PathBuf>,

    /// Script store connection string; the store is disabled when unset
    pub database_url: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 20,
            untitled_name: "Untitled Script".to_string(),
            session_path: None,
            database_url: None,
        }
    }
}

impl WorkspaceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count
    /// as unset; an unparsable interval keeps the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = value(ENV_SESSION_PATH) {
            config.session_path = Some(PathBuf::from(path));
        }
        config.database_url = value(ENV_DATABASE_URL);
        if let Some(raw) = value(ENV_AUTOSAVE_SECS) {
            match raw.trim().parse() {
                Ok(secs) => config.autosave_interval_secs = secs,
                Err(_) => log::warn!(
                    "Querydeck: ignoring invalid {}={:?}, using {}s",
                    ENV_AUTOSAVE_SECS,
                    raw,
                    config.autosave_interval_secs
                ),
            }
        }
        config
    }

    /// Autosave period, never shorter than one second.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(FileSessionStorage::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.autosave_interval(), Duration::from_secs(20));
        assert_eq!(config.untitled_name, "Untitled Script");
        assert!(config.database_url.is_none());
        assert!(config.session_path().ends_with("session.json"));
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_SESSION_PATH, "/tmp/qd/session.json"),
            (ENV_DATABASE_URL, "postgres://localhost/querydeck"),
            (ENV_AUTOSAVE_SECS, "5"),
        ]
        .into_iter()
        .collect();

        let config = WorkspaceConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.session_path(), PathBuf::from("/tmp/qd/session.json"));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/querydeck"));
        assert_eq!(config.autosave_interval_secs, 5);
    }

    #[test]
    fn test_config_ignores_blank_and_invalid_values() {
        let config = WorkspaceConfig::from_lookup(|k| match k {
            ENV_DATABASE_URL => Some("  ".to_string()),
            ENV_AUTOSAVE_SECS => Some("soon".to_string()),
            _ => None,
        });
        assert!(config.database_url.is_none());
        assert_eq!(config.autosave_interval_secs, 20);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = WorkspaceConfig {
            autosave_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.autosave_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: WorkspaceConfig = serde_json::from_str(r#"{"untitled_name": "Scratch"}"#).unwrap();
        assert_eq!(config.untitled_name, "Scratch");
        assert_eq!(config.autosave_interval_secs, 20);
    }
}
