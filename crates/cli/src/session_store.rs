//! Session persisted between invocations

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use unidash_core::Session;

const SESSION_FILE: &str = "session.json";

/// JSON file holding the identity provider session
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    /// Saved session, if any; an unreadable file counts as signed out
    pub fn load(&self) -> Option<Session> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring corrupt session file");
                None
            }
        }
    }

    /// Write `session`, or remove the file when signed out
    pub fn sync(&self, session: Option<&Session>) -> Result<()> {
        match session {
            Some(session) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let content = serde_json::to_string_pretty(session)?;
                write_private(&self.path, content.as_bytes())
                    .with_context(|| format!("failed to write {}", self.path.display()))?;
                debug!(path = %self.path.display(), "session saved");
            }
            None => match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "session removed"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            },
        }
        Ok(())
    }
}

/// Write a file only the owner can read; it holds the refresh token
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // The mode above only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)
}
