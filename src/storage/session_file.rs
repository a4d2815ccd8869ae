use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::User;

/// Local JSON file holding the last session's user snapshot.
///
/// Both local and HTTP backends use this for session restoration; it is
/// never the source of truth for portfolio data.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Session file inside `data_dir`, conventionally `session.json`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<User>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read session file: {:?}", self.path))
            }
        };

        let user = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse session file: {:?}", self.path))?;
        Ok(Some(user))
    }

    pub fn save(&self, user: &User) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create session dir: {parent:?}"))?;
        }

        let content = serde_json::to_string_pretty(user).context("failed to serialize session")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write session file: {:?}", self.path))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("failed to delete session file: {:?}", self.path))?;
        }
        Ok(())
    }
}
