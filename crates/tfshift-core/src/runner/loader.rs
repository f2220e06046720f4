//! Resolving a migration file into a migrator.

use crate::migration::{MigrationConfig, MigrationError, MigrationFile, MigrationKind, Migrator, StateMigrator};
use crate::state::terraform::DEFAULT_EXEC_PATH;
use crate::state::TerraformCli;
use std::path::{Path, PathBuf};

/// A migration file resolved into something that can run.
pub struct LoadedMigration {
    /// Identity recorded in the history.
    pub config: MigrationConfig,
    /// The migrator for the file.
    pub migrator: Box<dyn Migrator>,
}

/// Turns a migration file path into a [`LoadedMigration`].
pub trait MigrationLoader {
    /// Load the migration at `path`.
    fn load(&self, path: &Path) -> Result<LoadedMigration, MigrationError>;
}

/// Options shared by every migration of a run.
#[derive(Debug, Clone)]
pub struct MigratorOption {
    /// Path of the terraform executable.
    pub exec_path: PathBuf,
}

impl Default for MigratorOption {
    fn default() -> Self {
        Self {
            exec_path: PathBuf::from(DEFAULT_EXEC_PATH),
        }
    }
}

/// Loads JSON migration files and runs them with the `terraform` CLI.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    option: MigratorOption,
}

impl FileLoader {
    /// Create a loader with the given options.
    pub fn new(option: MigratorOption) -> Self {
        Self { option }
    }
}

impl MigrationLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<LoadedMigration, MigrationError> {
        let file = MigrationFile::load(path)?;
        let actions = file.actions()?;
        let m = &file.migration;

        let migrator: Box<dyn Migrator> = match m.kind {
            MigrationKind::State => {
                let mut tf = TerraformCli::new(&self.option.exec_path, &m.dir);
                if let Some(workspace) = &m.workspace {
                    tf = tf.with_workspace(workspace);
                }
                Box::new(StateMigrator::new(&m.name, Box::new(tf), actions).with_force(m.force))
            }
        };

        Ok(LoadedMigration {
            config: file.config(),
            migrator,
        })
    }
}
