//! Subcommand implementations.

use clap::ValueEnum;
use tfshift_core::history::{HistoryController, HistoryError, HistoryStore};
use tfshift_core::runner::{FileLoader, MigrationRunner, RunError};
use tfshift_core::{RunContext, TfshiftConfig};

/// Boxed error returned by every command.
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// Which migration files `list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListStatus {
    /// Every migration file
    All,
    /// Files recorded in the history
    Applied,
    /// Files not yet recorded
    Unapplied,
}

/// Output format for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One filename per line
    Text,
    /// JSON array
    Json,
}

fn open_history(config: &TfshiftConfig) -> Result<HistoryController, HistoryError> {
    HistoryController::open(&config.migration_dir, Box::new(config.history_storage()))
}

fn runner(
    config: &TfshiftConfig,
    filename: Option<String>,
) -> Result<MigrationRunner<HistoryController, FileLoader>, HistoryError> {
    let history = open_history(config)?;
    let loader = FileLoader::new(config.migrator_option());
    Ok(MigrationRunner::new(
        filename,
        &config.migration_dir,
        history,
        loader,
    ))
}

/// Plan one migration file, or every unapplied file.
pub fn plan(
    config: &TfshiftConfig,
    filename: Option<String>,
    ctx: &RunContext,
) -> Result<(), CommandError> {
    runner(config, filename)?.plan(ctx)?;
    Ok(())
}

/// Apply one migration file, or every unapplied file.
pub fn apply(
    config: &TfshiftConfig,
    filename: Option<String>,
    ctx: &RunContext,
) -> Result<(), CommandError> {
    let mut runner = runner(config, filename)?;
    if let Err(e) = runner.apply(ctx) {
        warn_state_changes(&e);
        return Err(e.into());
    }
    Ok(())
}

fn warn_state_changes(err: &RunError) {
    let applied = err.applied_files();
    if !applied.is_empty() {
        tracing::warn!(
            files = %applied.join(", "),
            "these migrations were applied before the failure"
        );
    } else if err.state_may_have_changed() {
        tracing::warn!("state may have been modified before the failure");
    }
}

/// Migration files matching `status`, with whether each was applied.
pub fn list(
    config: &TfshiftConfig,
    status: ListStatus,
) -> Result<Vec<(String, bool)>, HistoryError> {
    let history = open_history(config)?;
    let files = history
        .migrations()
        .iter()
        .map(|f| (f.clone(), history.already_applied(f)))
        .filter(|(_, applied)| match status {
            ListStatus::All => true,
            ListStatus::Applied => *applied,
            ListStatus::Unapplied => !*applied,
        })
        .collect();
    Ok(files)
}

/// Render a `list` result.
pub fn format_list(files: &[(String, bool)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => files
            .iter()
            .map(|(f, _)| f.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = files
                .iter()
                .map(|(f, applied)| serde_json::json!({ "filename": f, "applied": applied }))
                .collect();
            serde_json::Value::Array(entries).to_string()
        }
    }
}
