//! Migration history.
//!
//! The history records which migration files have been applied. It is the
//! source of truth both for refusing to re-apply a file and for finding the
//! unapplied files of a migration directory.
//!
//! The history file is JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "records": {
//!     "20240501_rename_app.json": {
//!       "type": "state",
//!       "name": "rename_app",
//!       "applied_at": "2024-05-01T12:00:00Z"
//!     }
//!   }
//! }
//! ```

pub mod controller;
pub mod error;
pub mod record;
pub mod storage;
pub mod store;

pub use controller::{list_migration_files, HistoryController, MIGRATION_EXTENSION};
pub use error::HistoryError;
pub use record::{HistoryLog, MigrationRecord, HISTORY_VERSION};
pub use storage::{HistoryStorage, LocalStorage, MemoryStorage};
pub use store::HistoryStore;
