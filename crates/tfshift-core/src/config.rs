//! Run configuration.

use crate::history::LocalStorage;
use crate::runner::MigratorOption;
use crate::state::terraform::DEFAULT_EXEC_PATH;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tfshift.json";

/// Default directory holding migration files.
pub const DEFAULT_MIGRATION_DIR: &str = ".";

/// Default history file path.
pub const DEFAULT_HISTORY_PATH: &str = "tfshift_history.json";

/// Environment variable overriding the terraform executable.
pub const EXEC_PATH_ENV: &str = "TFSHIFT_EXEC_PATH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    migration_dir: Option<PathBuf>,
    history_path: Option<PathBuf>,
    exec_path: Option<PathBuf>,
}

/// tfshift configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfshiftConfig {
    /// Directory holding migration files.
    pub migration_dir: PathBuf,

    /// Path of the history file.
    pub history_path: PathBuf,

    /// Path of the terraform executable.
    pub exec_path: PathBuf,
}

impl TfshiftConfig {
    /// Create a configuration for the given migration directory.
    pub fn new(migration_dir: impl Into<PathBuf>) -> Self {
        Self {
            migration_dir: migration_dir.into(),
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            exec_path: PathBuf::from(DEFAULT_EXEC_PATH),
        }
    }

    /// Load a config file, layered over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile =
            serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::default().merge(file))
    }

    /// Load a config file if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(dir) = file.migration_dir {
            self.migration_dir = dir;
        }
        if let Some(path) = file.history_path {
            self.history_path = path;
        }
        if let Some(path) = file.exec_path {
            self.exec_path = path;
        }
        self
    }

    /// Apply `TFSHIFT_EXEC_PATH` if it is set.
    pub fn with_env(self) -> Self {
        let exec_path = std::env::var_os(EXEC_PATH_ENV).map(PathBuf::from);
        self.with_exec_path_override(exec_path)
    }

    fn with_exec_path_override(mut self, exec_path: Option<PathBuf>) -> Self {
        if let Some(path) = exec_path.filter(|p| !p.as_os_str().is_empty()) {
            self.exec_path = path;
        }
        self
    }

    /// Set the migration directory.
    pub fn with_migration_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migration_dir = dir.into();
        self
    }

    /// Set the history file path.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = path.into();
        self
    }

    /// Set the terraform executable.
    pub fn with_exec_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.exec_path = path.into();
        self
    }

    /// Storage for the history file.
    pub fn history_storage(&self) -> LocalStorage {
        LocalStorage::new(&self.history_path)
    }

    /// Options handed to every migrator.
    pub fn migrator_option(&self) -> MigratorOption {
        MigratorOption {
            exec_path: self.exec_path.clone(),
        }
    }
}

impl Default for TfshiftConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MIGRATION_DIR)
    }
}
