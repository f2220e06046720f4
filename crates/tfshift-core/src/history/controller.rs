//! History controller - joins the migration directory with the history log.

use super::error::HistoryError;
use super::record::{HistoryLog, MigrationRecord};
use super::storage::HistoryStorage;
use super::store::HistoryStore;
use crate::state::RunContext;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Extension of migration files.
pub const MIGRATION_EXTENSION: &str = "json";

/// History controller backed by a [`HistoryStorage`].
pub struct HistoryController {
    migration_dir: PathBuf,
    migrations: Vec<String>,
    log: HistoryLog,
    storage: Box<dyn HistoryStorage>,
}

impl HistoryController {
    /// Scan `migration_dir` and load the history from `storage`.
    pub fn open(
        migration_dir: impl Into<PathBuf>,
        storage: Box<dyn HistoryStorage>,
    ) -> Result<Self, HistoryError> {
        let migration_dir = migration_dir.into();
        let migrations = list_migration_files(&migration_dir)?;
        let log = match storage.read()? {
            Some(bytes) => HistoryLog::from_bytes(&bytes)?,
            None => HistoryLog::new(),
        };

        tracing::debug!(
            migration_dir = %migration_dir.display(),
            migrations = migrations.len(),
            records = log.len(),
            "history loaded"
        );

        Ok(Self::new(migration_dir, migrations, log, storage))
    }

    /// Build a controller from already-known parts.
    pub fn new(
        migration_dir: impl Into<PathBuf>,
        migrations: Vec<String>,
        log: HistoryLog,
        storage: Box<dyn HistoryStorage>,
    ) -> Self {
        Self {
            migration_dir: migration_dir.into(),
            migrations,
            log,
            storage,
        }
    }

    /// Directory holding migration files.
    pub fn migration_dir(&self) -> &Path {
        &self.migration_dir
    }

    /// Every migration file, in file order.
    pub fn migrations(&self) -> &[String] {
        &self.migrations
    }

    /// The history log.
    pub fn log(&self) -> &HistoryLog {
        &self.log
    }
}

impl HistoryStore for HistoryController {
    fn already_applied(&self, filename: &str) -> bool {
        self.log.contains(filename)
    }

    fn unapplied_migrations(&self) -> Vec<String> {
        self.migrations
            .iter()
            .filter(|f| !self.log.contains(f))
            .cloned()
            .collect()
    }

    fn add_record(
        &mut self,
        filename: &str,
        kind: &str,
        name: &str,
        applied_at: Option<DateTime<Utc>>,
    ) {
        let record = MigrationRecord {
            kind: kind.to_string(),
            name: name.to_string(),
            applied_at: applied_at.unwrap_or_else(Utc::now),
        };
        if !self.log.insert(filename, record) {
            tracing::warn!(filename, "history already has a record, keeping the existing one");
        }
    }

    fn len(&self) -> usize {
        self.log.len()
    }

    fn save(&self, ctx: &RunContext) -> Result<(), HistoryError> {
        // Records describe state that was already pushed, so they are
        // written even when the run is being cancelled.
        if ctx.is_cancelled() {
            tracing::warn!("run cancelled, saving history of completed migrations");
        }
        let bytes = self.log.to_bytes()?;
        self.storage.write(&bytes)
    }
}

/// List migration files in `dir`, sorted by name.
///
/// Hidden files, directories and files without the migration extension are
/// skipped.
pub fn list_migration_files(dir: &Path) -> Result<Vec<String>, HistoryError> {
    let io_error = |source| HistoryError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        if !entry.file_type().map_err(io_error)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_migration = !name.starts_with('.')
            && Path::new(&name).extension().and_then(|e| e.to_str()) == Some(MIGRATION_EXTENSION);
        if is_migration {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::storage::MemoryStorage;
    use std::sync::Arc;

    fn controller(migrations: &[&str]) -> HistoryController {
        HistoryController::new(
            "migrations",
            migrations.iter().map(|s| s.to_string()).collect(),
            HistoryLog::new(),
            Box::new(MemoryStorage::new()),
        )
    }

    #[test]
    fn test_unapplied_excludes_recorded() {
        let mut hc = controller(&["001_a.json", "002_b.json", "003_c.json"]);
        hc.add_record("002_b.json", "state", "b", None);

        assert!(hc.already_applied("002_b.json"));
        assert!(!hc.already_applied("001_a.json"));
        assert_eq!(hc.unapplied_migrations(), vec!["001_a.json", "003_c.json"]);
        assert_eq!(hc.len(), 1);
    }

    #[test]
    fn test_add_record_is_write_once() {
        let mut hc = controller(&["001_a.json"]);
        hc.add_record("001_a.json", "state", "a", None);
        let first = hc.log().get("001_a.json").cloned().unwrap();
        hc.add_record("001_a.json", "state", "renamed", None);
        assert_eq!(hc.len(), 1);
        assert_eq!(hc.log().get("001_a.json"), Some(&first));
    }

    #[test]
    fn test_open_scans_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["002_b.json", "001_a.json", ".hidden.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("003_dir.json")).unwrap();

        let hc = HistoryController::open(dir.path(), Box::new(MemoryStorage::new())).unwrap();
        assert_eq!(hc.migrations(), &["001_a.json".to_string(), "002_b.json".to_string()]);
        assert!(hc.log().is_empty());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001_a.json"), "{}").unwrap();
        let storage = Arc::new(MemoryStorage::new());

        let mut hc = HistoryController::open(dir.path(), Box::new(Arc::clone(&storage))).unwrap();
        hc.add_record("001_a.json", "state", "a", None);
        hc.save(&RunContext::new()).unwrap();
        assert_eq!(storage.write_count(), 1);

        let reopened = HistoryController::open(dir.path(), Box::new(Arc::clone(&storage))).unwrap();
        assert!(reopened.already_applied("001_a.json"));
        assert!(reopened.unapplied_migrations().is_empty());
    }

    #[test]
    fn test_save_after_cancel() {
        let mut hc = controller(&["001_a.json"]);
        hc.add_record("001_a.json", "state", "a", None);
        let ctx = RunContext::new();
        ctx.cancel();
        assert!(hc.save(&ctx).is_ok());
    }

    #[test]
    fn test_open_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = HistoryController::open(dir.path().join("nope"), Box::new(MemoryStorage::new()));
        assert!(matches!(result, Err(HistoryError::Io { .. })));
    }
}
