// Querydeck Backends - File Session Storage
//
// Keeps the serialized session in a single JSON file under the user's config
// directory. Writes go to a sibling temp file first and are renamed into
// place, so a crash mid-write never leaves a truncated session behind.

use async_trait::async_trait;
use log::debug;
use std::io;
use std::path::{Path, PathBuf};

use super::adapter::SessionStorage;
use super::error::BackendResult;

pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/querydeck/session.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querydeck")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileSessionStorage {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> BackendResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Querydeck: no session file at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, serialized: &str) -> BackendResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, serialized).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(
            "Querydeck: wrote {} bytes of session state to {}",
            serialized.len(),
            self.path.display()
        );
        Ok(())
    }
}
