//! `techtrace.toml` loading.
//!
//! ```toml
//! [backend]
//! name = "http"
//! base_url = "http://localhost:8000/api"
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! file = "techtrace.log"
//!
//! [session]
//! file = ".techtrace-session.json"
//! ```
//!
//! Every table and key is optional.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use trace_core::api::BackendConfig;
use tracing::{debug, info};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "techtrace.toml";

pub const DEFAULT_SESSION_FILE: &str = ".techtrace-session.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl AppConfig {
    pub fn from_toml(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `explicit` when given; it must exist. Otherwise reads
    /// [`DEFAULT_CONFIG_FILE`] if present and falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                info!(path = %path.display(), "loading configuration");
                Self::from_toml(&text, &path)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Applies command-line overrides on top of file values.
    pub fn apply_overrides(
        &mut self,
        backend: Option<String>,
        base_url: Option<String>,
        log_level: Option<String>,
    ) {
        if let Some(backend) = backend {
            self.backend.backend = backend;
        }
        if let Some(base_url) = base_url {
            self.backend.base_url = base_url;
        }
        if log_level.is_some() {
            self.logging.level = log_level;
        }
    }
}
