//! tfshift core - wildcard state moves and history-aware migrations.
//!
//! This crate expands wildcard moves over a Terraform state listing, folds
//! state actions over a pulled snapshot, and runs migration files against a
//! history of applied files.

pub mod action;
pub mod address;
pub mod config;
pub mod error;
pub mod history;
pub mod migration;
pub mod runner;
pub mod state;

pub use action::{
    apply_all, parse_action, ActionError, ExpansionAction, ImportAction, MoveAction,
    RemoveAction, StateAction,
};
pub use address::{expand, MoveOperation, PatternError};
pub use config::{ConfigError, TfshiftConfig};
pub use error::StateStoreError;
pub use history::{
    HistoryController, HistoryError, HistoryLog, HistoryStorage, HistoryStore, LocalStorage,
    MemoryStorage, MigrationRecord,
};
pub use migration::{MigrationConfig, MigrationError, MigrationFile, MigrationKind, Migrator, StateMigrator};
pub use runner::{FileLoader, MigrationLoader, MigrationRunner, MigratorOption, RunError};
pub use state::{MemoryStateStore, PlanOutcome, RunContext, State, StateStore, TerraformCli};
