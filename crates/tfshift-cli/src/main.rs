//! tfshift command-line interface.
//!
//! Plans and applies Terraform state migrations recorded in a history file.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CommandError, ListStatus, OutputFormat};
use std::path::{Path, PathBuf};
use tfshift_core::config::DEFAULT_CONFIG_FILE;
use tfshift_core::{ConfigError, RunContext, TfshiftConfig};

/// tfshift - Terraform state migrations with history
#[derive(Parser, Debug)]
#[command(name = "tfshift")]
#[command(version, about = "Terraform state migrations with history", long_about = None)]
pub struct Args {
    /// Config file (defaults to .tfshift.json when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding migration files
    #[arg(long)]
    pub migration_dir: Option<PathBuf>,

    /// History file path
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Terraform executable
    #[arg(long)]
    pub exec_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan one migration file, or every unapplied file
    Plan {
        /// Migration file name inside the migration directory
        filename: Option<String>,
    },
    /// Apply one migration file, or every unapplied file
    Apply {
        /// Migration file name inside the migration directory
        filename: Option<String>,
    },
    /// List migration files
    List {
        /// Which files to list
        #[arg(long, default_value = "all", value_enum)]
        status: ListStatus,

        /// Output format
        #[arg(long, default_value = "text", value_enum)]
        format: OutputFormat,
    },
}

impl Args {
    /// Resolve the configuration: config file, then environment, then flags.
    pub fn into_config(self) -> Result<(TfshiftConfig, Command), ConfigError> {
        let config = match &self.config {
            Some(path) => TfshiftConfig::load(path)?,
            None => TfshiftConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        let mut config = config.with_env();

        if let Some(dir) = self.migration_dir {
            config = config.with_migration_dir(dir);
        }
        if let Some(path) = self.history {
            config = config.with_history_path(path);
        }
        if let Some(path) = self.exec_path {
            config = config.with_exec_path(path);
        }
        Ok((config, self.command))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tfshift={}", args.log_level).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CommandError> {
    let (config, command) = args.into_config()?;

    tracing::debug!(
        migration_dir = %config.migration_dir.display(),
        history = %config.history_path.display(),
        exec_path = %config.exec_path.display(),
        "configuration loaded"
    );

    let ctx = RunContext::new();
    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::warn!("received interrupt, cancelling");
        signal_ctx.cancel();
    });

    tokio::task::spawn_blocking(move || match command {
        Command::Plan { filename } => commands::plan(&config, filename, &ctx),
        Command::Apply { filename } => commands::apply(&config, filename, &ctx),
        Command::List { status, format } => {
            let files = commands::list(&config, status)?;
            let output = commands::format_list(&files, format);
            if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
    })
    .await?
}
