//! History-aware migration runner.
//!
//! Runs a single migration file, or every unapplied file of the migration
//! directory, and records applied files in the history.

use super::error::RunError;
use super::loader::{LoadedMigration, MigrationLoader};
use crate::history::HistoryStore;
use crate::state::RunContext;
use std::path::PathBuf;

/// Runs migrations and keeps the history in step with them.
pub struct MigrationRunner<H, L> {
    /// Migration file to run. If unset, every unapplied file is run.
    filename: Option<String>,
    migration_dir: PathBuf,
    history: H,
    loader: L,
}

impl<H: HistoryStore, L: MigrationLoader> MigrationRunner<H, L> {
    /// Create a runner.
    pub fn new(
        filename: Option<String>,
        migration_dir: impl Into<PathBuf>,
        history: H,
        loader: L,
    ) -> Self {
        Self {
            filename: filename.filter(|f| !f.is_empty()),
            migration_dir: migration_dir.into(),
            history,
            loader,
        }
    }

    /// The history this runner records into.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Plan one file, or every unapplied file. Never touches the history.
    pub fn plan(&self, ctx: &RunContext) -> Result<(), RunError> {
        match &self.filename {
            Some(filename) => self.plan_file(ctx, filename),
            None => self.plan_dir(ctx),
        }
    }

    fn plan_file(&self, ctx: &RunContext, filename: &str) -> Result<(), RunError> {
        let loaded = self.load(filename)?;
        loaded
            .migrator
            .plan(ctx)
            .map_err(|source| RunError::Migration {
                filename: filename.to_string(),
                source,
            })
    }

    fn plan_dir(&self, ctx: &RunContext) -> Result<(), RunError> {
        for filename in self.unapplied() {
            if ctx.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            self.plan_file(ctx, &filename)?;
        }
        Ok(())
    }

    /// Apply one file, or every unapplied file, and save the history.
    ///
    /// The history is saved once at the end of the run, on success and on
    /// failure, but only if the run added records.
    pub fn apply(&mut self, ctx: &RunContext) -> Result<(), RunError> {
        let before = self.history.len();
        let mut applied = Vec::new();

        let result = match self.filename.clone() {
            Some(filename) => self.apply_file(ctx, &filename),
            None => self.apply_dir(ctx, &mut applied),
        };

        // Files pushed before the failure are live; say so in the error.
        let result = result.map_err(|source| {
            if applied.is_empty() {
                return source;
            }
            tracing::warn!(files = ?applied, "run stopped after applying migrations");
            RunError::Incomplete {
                applied,
                source: Box::new(source),
            }
        });

        self.finalize(ctx, before, result)
    }

    fn apply_file(&mut self, ctx: &RunContext, filename: &str) -> Result<(), RunError> {
        let loaded = self.load(filename)?;
        loaded
            .migrator
            .apply(ctx)
            .map_err(|source| RunError::Migration {
                filename: filename.to_string(),
                source,
            })?;

        let kind = loaded.config.kind.to_string();
        tracing::info!(
            filename,
            kind = %kind,
            name = %loaded.config.name,
            "adding history record"
        );
        self.history
            .add_record(filename, &kind, &loaded.config.name, None);
        Ok(())
    }

    fn apply_dir(&mut self, ctx: &RunContext, applied: &mut Vec<String>) -> Result<(), RunError> {
        for filename in self.unapplied() {
            if ctx.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            self.apply_file(ctx, &filename)?;
            applied.push(filename);
        }
        Ok(())
    }

    /// Persist the history if the run changed it, without losing `result`.
    fn finalize(
        &self,
        ctx: &RunContext,
        before: usize,
        result: Result<(), RunError>,
    ) -> Result<(), RunError> {
        // Nothing recorded: leave the history file untouched.
        if self.history.len() == before {
            return result;
        }

        let persist = match self.history.save(ctx) {
            Ok(()) => {
                tracing::info!(records = self.history.len(), "history saved");
                return result;
            }
            Err(e) => e,
        };

        tracing::error!(error = %persist, "failed to save history, the history may be inconsistent");
        match result {
            Ok(()) => Err(RunError::HistoryNotSaved { source: persist }),
            Err(apply) => Err(RunError::Composite {
                apply: Box::new(apply),
                persist,
            }),
        }
    }

    /// Refuse already-applied files, then resolve the file.
    fn load(&self, filename: &str) -> Result<LoadedMigration, RunError> {
        if self.history.already_applied(filename) {
            return Err(RunError::AlreadyApplied {
                filename: filename.to_string(),
            });
        }
        let path = self.migration_dir.join(filename);
        self.loader
            .load(&path)
            .map_err(|source| RunError::Load {
                filename: filename.to_string(),
                source,
            })
    }

    fn unapplied(&self) -> Vec<String> {
        let unapplied = self.history.unapplied_migrations();
        if unapplied.is_empty() {
            tracing::info!("no unapplied migrations");
        } else {
            tracing::info!(files = ?unapplied, "unapplied migration files");
        }
        unapplied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryError;
    use crate::migration::{MigrationConfig, MigrationError, MigrationKind, Migrator};
    use crate::error::StateStoreError;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::collections::BTreeSet;
    use std::path::Path;
    use std::sync::Arc;

    /// History store that counts saves and can be told to fail them.
    #[derive(Default)]
    struct FakeHistory {
        files: Vec<String>,
        applied: BTreeSet<String>,
        saves: Arc<Mutex<usize>>,
        fail_save: bool,
    }

    impl FakeHistory {
        fn with_files(files: &[&str]) -> Self {
            Self {
                files: files.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    impl HistoryStore for FakeHistory {
        fn already_applied(&self, filename: &str) -> bool {
            self.applied.contains(filename)
        }

        fn unapplied_migrations(&self) -> Vec<String> {
            self.files
                .iter()
                .filter(|f| !self.applied.contains(*f))
                .cloned()
                .collect()
        }

        fn add_record(&mut self, filename: &str, _: &str, _: &str, _: Option<DateTime<Utc>>) {
            self.applied.insert(filename.to_string());
        }

        fn len(&self) -> usize {
            self.applied.len()
        }

        fn save(&self, _: &RunContext) -> Result<(), HistoryError> {
            *self.saves.lock() += 1;
            if self.fail_save {
                return Err(HistoryError::Unavailable("disk full".to_string()));
            }
            Ok(())
        }
    }

    /// Migrator that succeeds unless its file is listed as failing.
    struct FakeMigrator {
        fail: bool,
    }

    impl Migrator for FakeMigrator {
        fn plan(&self, _: &RunContext) -> Result<(), MigrationError> {
            self.apply(&RunContext::new())
        }

        fn apply(&self, _: &RunContext) -> Result<(), MigrationError> {
            if self.fail {
                return Err(MigrationError::Push(StateStoreError::AddressExists {
                    address: "a.y".to_string(),
                }));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeLoader {
        failing: Vec<String>,
        loaded: Arc<Mutex<Vec<String>>>,
    }

    impl MigrationLoader for FakeLoader {
        fn load(&self, path: &Path) -> Result<LoadedMigration, MigrationError> {
            let filename = path.file_name().unwrap().to_string_lossy().into_owned();
            self.loaded.lock().push(filename.clone());
            Ok(LoadedMigration {
                config: MigrationConfig {
                    kind: MigrationKind::State,
                    name: filename.clone(),
                },
                migrator: Box::new(FakeMigrator {
                    fail: self.failing.contains(&filename),
                }),
            })
        }
    }

    fn runner(
        filename: Option<&str>,
        history: FakeHistory,
        loader: FakeLoader,
    ) -> MigrationRunner<FakeHistory, FakeLoader> {
        MigrationRunner::new(filename.map(String::from), "migrations", history, loader)
    }

    #[test]
    fn test_apply_single_file_records_and_saves() {
        let history = FakeHistory::with_files(&["001_a.json"]);
        let saves = Arc::clone(&history.saves);
        let mut r = runner(Some("001_a.json"), history, FakeLoader::default());

        r.apply(&RunContext::new()).unwrap();
        assert!(r.history().already_applied("001_a.json"));
        assert_eq!(*saves.lock(), 1);
    }

    #[test]
    fn test_apply_same_file_twice() {
        let history = FakeHistory::with_files(&["001_a.json"]);
        let saves = Arc::clone(&history.saves);
        let mut r = runner(Some("001_a.json"), history, FakeLoader::default());

        r.apply(&RunContext::new()).unwrap();
        let err = r.apply(&RunContext::new()).unwrap_err();
        assert!(matches!(err, RunError::AlreadyApplied { .. }));
        assert_eq!(r.history().len(), 1);
        // The rejected second run saved nothing.
        assert_eq!(*saves.lock(), 1);
    }

    #[test]
    fn test_plan_already_applied_file() {
        let mut history = FakeHistory::with_files(&["001_a.json"]);
        history.applied.insert("001_a.json".to_string());
        let r = runner(Some("001_a.json"), history, FakeLoader::default());
        assert!(matches!(
            r.plan(&RunContext::new()),
            Err(RunError::AlreadyApplied { .. })
        ));
    }

    #[test]
    fn test_apply_dir_stops_at_first_failure() {
        let history = FakeHistory::with_files(&["a.json", "b.json", "c.json"]);
        let saves = Arc::clone(&history.saves);
        let loader = FakeLoader {
            failing: vec!["b.json".to_string()],
            ..FakeLoader::default()
        };
        let loaded = Arc::clone(&loader.loaded);
        let mut r = runner(None, history, loader);

        let err = r.apply(&RunContext::new()).unwrap_err();
        match &err {
            RunError::Incomplete { applied, source } => {
                assert_eq!(applied, &vec!["a.json".to_string()]);
                assert!(matches!(
                    source.as_ref(),
                    RunError::Migration { filename, .. } if filename == "b.json"
                ));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.state_may_have_changed());
        assert!(r.history().already_applied("a.json"));
        assert!(!r.history().already_applied("b.json"));
        assert_eq!(*loaded.lock(), vec!["a.json", "b.json"]);
        // a.json was recorded, so the history is saved despite the failure.
        assert_eq!(*saves.lock(), 1);
    }

    #[test]
    fn test_plan_never_saves() {
        let history = FakeHistory::with_files(&["a.json", "b.json"]);
        let saves = Arc::clone(&history.saves);
        let r = runner(None, history, FakeLoader::default());

        r.plan(&RunContext::new()).unwrap();
        assert_eq!(r.history().len(), 0);
        assert_eq!(*saves.lock(), 0);
    }

    #[test]
    fn test_apply_empty_batch_skips_save() {
        let mut history = FakeHistory::with_files(&["a.json"]);
        history.applied.insert("a.json".to_string());
        let saves = Arc::clone(&history.saves);
        let mut r = runner(None, history, FakeLoader::default());

        r.apply(&RunContext::new()).unwrap();
        assert_eq!(*saves.lock(), 0);
    }

    #[test]
    fn test_save_failure_after_success() {
        let mut history = FakeHistory::with_files(&["a.json"]);
        history.fail_save = true;
        let mut r = runner(None, history, FakeLoader::default());

        let err = r.apply(&RunContext::new()).unwrap_err();
        assert!(matches!(err, RunError::HistoryNotSaved { .. }));
        assert!(err.to_string().starts_with("apply succeeded, but failed to save history"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_save_failure_after_failure() {
        let mut history = FakeHistory::with_files(&["a.json", "b.json"]);
        history.fail_save = true;
        let loader = FakeLoader {
            failing: vec!["b.json".to_string()],
            ..FakeLoader::default()
        };
        let mut r = runner(None, history, loader);

        let err = r.apply(&RunContext::new()).unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, RunError::Composite { .. }));
        assert!(text.contains("disk full"));
        assert!(text.contains("b.json"));
        assert!(text.contains("a.y"));
    }

    #[test]
    fn test_cancelled_before_batch() {
        let history = FakeHistory::with_files(&["a.json"]);
        let saves = Arc::clone(&history.saves);
        let loader = FakeLoader::default();
        let loaded = Arc::clone(&loader.loaded);
        let mut r = runner(None, history, loader);

        let ctx = RunContext::new();
        ctx.cancel();
        let err = r.apply(&ctx).unwrap_err();
        assert!(err.is_cancelled());
        assert!(loaded.lock().is_empty());
        assert_eq!(*saves.lock(), 0);
    }

    #[test]
    fn test_empty_filename_means_directory_mode() {
        let history = FakeHistory::with_files(&["a.json", "b.json"]);
        let mut r = runner(Some(""), history, FakeLoader::default());
        r.apply(&RunContext::new()).unwrap();
        assert_eq!(r.history().len(), 2);
    }
}
