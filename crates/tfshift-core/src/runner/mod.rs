//! History-aware migration runner.
//!
//! In single-file mode the runner refuses files already recorded in the
//! history. In directory mode it runs every unapplied file in file order and
//! stops at the first failure. After `apply`, the history is saved if and
//! only if the run recorded something, and a save failure never hides the
//! apply failure that preceded it.

pub mod error;
pub mod history_runner;
pub mod loader;

pub use error::RunError;
pub use history_runner::MigrationRunner;
pub use loader::{FileLoader, LoadedMigration, MigrationLoader, MigratorOption};
