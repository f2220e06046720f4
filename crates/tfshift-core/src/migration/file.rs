//! Migration file format.
//!
//! A migration file is a JSON document:
//!
//! ```json
//! {
//!   "migration": {
//!     "type": "state",
//!     "name": "rename_app_module",
//!     "dir": "envs/prod",
//!     "workspace": "default",
//!     "force": false,
//!     "actions": [
//!       "xmv module.app[*].aws_instance.web module.web[$1].aws_instance.this",
//!       "rm aws_instance.legacy"
//!     ]
//!   }
//! }
//! ```

use super::error::MigrationError;
use crate::action::{parse_action, StateAction};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    /// Actions against a single state.
    State,
}

impl std::fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationKind::State => write!(f, "state"),
        }
    }
}

/// Identity of a migration, recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Kind of migration.
    pub kind: MigrationKind,
    /// Name of the migration.
    pub name: String,
}

/// Top-level document of a migration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationFile {
    /// The migration block.
    pub migration: MigrationBlock,
}

/// The `migration` block of a migration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationBlock {
    /// Kind of migration.
    #[serde(rename = "type")]
    pub kind: MigrationKind,
    /// Name of the migration.
    pub name: String,
    /// Terraform working directory, relative to the current directory.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// Terraform workspace.
    #[serde(default)]
    pub workspace: Option<String>,
    /// Apply even if the plan after migration still has changes.
    #[serde(default)]
    pub force: bool,
    /// Actions, in order.
    pub actions: Vec<String>,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl MigrationFile {
    /// Read and parse a migration file.
    pub fn load(path: &Path) -> Result<Self, MigrationError> {
        let bytes = std::fs::read(path).map_err(|source| MigrationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes)
    }

    /// Parse a migration file from bytes. `path` is used in errors only.
    pub fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, MigrationError> {
        let file: Self = serde_json::from_slice(bytes).map_err(|source| MigrationError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), MigrationError> {
        let m = &self.migration;
        if m.name.trim().is_empty() {
            return Err(MigrationError::Invalid {
                name: m.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if m.actions.is_empty() {
            return Err(MigrationError::Invalid {
                name: m.name.clone(),
                reason: "at least one action is required".to_string(),
            });
        }
        Ok(())
    }

    /// Identity recorded in the history.
    pub fn config(&self) -> MigrationConfig {
        MigrationConfig {
            kind: self.migration.kind,
            name: self.migration.name.clone(),
        }
    }

    /// Parse the action strings.
    pub fn actions(&self) -> Result<Vec<Box<dyn StateAction>>, MigrationError> {
        self.migration
            .actions
            .iter()
            .map(|a| parse_action(a).map_err(MigrationError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<MigrationFile, MigrationError> {
        MigrationFile::from_slice(Path::new("test.json"), json.as_bytes())
    }

    #[test]
    fn test_parse_minimal() {
        let file = parse(r#"{"migration": {"type": "state", "name": "m1", "actions": ["mv a.b c.d"]}}"#)
            .unwrap();
        assert_eq!(file.migration.dir, PathBuf::from("."));
        assert!(!file.migration.force);
        assert_eq!(
            file.config(),
            MigrationConfig {
                kind: MigrationKind::State,
                name: "m1".to_string()
            }
        );
        assert_eq!(file.actions().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_full() {
        let file = parse(
            r#"{"migration": {
                "type": "state",
                "name": "m2",
                "dir": "envs/prod",
                "workspace": "blue",
                "force": true,
                "actions": ["xmv module.a[*].r module.b[$1].r", "import aws_instance.x i-1"]
            }}"#,
        )
        .unwrap();
        assert_eq!(file.migration.dir, PathBuf::from("envs/prod"));
        assert_eq!(file.migration.workspace.as_deref(), Some("blue"));
        assert!(file.migration.force);
        assert_eq!(file.migration.kind.to_string(), "state");
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result = parse(r#"{"migration": {"type": "multi_state", "name": "m", "actions": ["mv a b"]}}"#);
        assert!(matches!(result, Err(MigrationError::Parse { .. })));
    }

    #[test]
    fn test_rejects_empty_actions() {
        let result = parse(r#"{"migration": {"type": "state", "name": "m", "actions": []}}"#);
        assert!(matches!(result, Err(MigrationError::Invalid { .. })));
    }

    #[test]
    fn test_bad_action_surfaces_on_actions() {
        let file = parse(r#"{"migration": {"type": "state", "name": "m", "actions": ["mv a"]}}"#).unwrap();
        assert!(matches!(file.actions(), Err(MigrationError::Action(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = MigrationFile::load(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(MigrationError::Read { .. })));
    }
}
