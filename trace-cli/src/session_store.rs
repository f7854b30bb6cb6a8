use std::fs::OpenOptions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use thiserror::Error;
use trace_core::api::Session;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("cannot access session file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file '{}' is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Owner read/write only; the file holds a bearer token.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Keeps the session between invocations as a small JSON file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an anonymous session.
    pub fn load(&self) -> Result<Session, SessionStoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Session::anonymous()),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&text).map_err(|source| SessionStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    pub fn save(
        &self,
        session: &Session,
    ) -> Result<(), SessionStoreError> {
        let text = serde_json::to_string_pretty(session).map_err(|source| {
            SessionStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        self.write_private(text.as_bytes())
            .map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Removing an absent file is not an error.
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write_private(
        &self,
        bytes: &[u8],
    ) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);

        let mut file = options.open(&self.path)?;
        // `mode` only applies when the file is created.
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(SESSION_FILE_MODE))?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn io_error(
        &self,
        source: io::Error,
    ) -> SessionStoreError {
        SessionStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
