//! State store backed by the `terraform` CLI.
//!
//! Snapshots are raw `terraform.tfstate` bytes. Mutations run against a
//! private copy of the snapshot in a temporary directory with `-state=`, so
//! nothing reaches the configured backend until [`StateStore::push`].

use super::{PlanOutcome, RunContext, State, StateStore};
use crate::error::StateStoreError;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tempfile::TempDir;

/// Default executable name.
pub const DEFAULT_EXEC_PATH: &str = "terraform";

/// Default interval between cancellation checks while a command runs.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Name of the working copy of the state inside the scratch directory.
const STATE_FILE: &str = "terraform.tfstate";

struct CommandOutput {
    command: String,
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CommandOutput {
    fn into_checked(self) -> Result<Vec<u8>, StateStoreError> {
        if self.status.success() {
            Ok(self.stdout)
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> StateStoreError {
        StateStoreError::Command {
            command: self.command,
            status: self.status.to_string(),
            stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
        }
    }
}

/// `terraform` CLI adapter for one working directory.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    exec_path: PathBuf,
    dir: PathBuf,
    workspace: Option<String>,
    poll_interval: Duration,
}

impl TerraformCli {
    /// Create an adapter running `exec_path` inside `dir`.
    pub fn new(exec_path: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self {
            exec_path: exec_path.into(),
            dir: dir.into(),
            workspace: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Select a non-default workspace.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Set the cancellation polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Working directory of the adapter.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut parts = vec![self.exec_path.display().to_string()];
        parts.extend(args.iter().map(|a| a.to_string()));
        parts.join(" ")
    }

    /// Run a command, killing it if the context is cancelled.
    fn run(&self, ctx: &RunContext, args: &[&str]) -> Result<CommandOutput, StateStoreError> {
        ctx.check()?;

        // Files instead of pipes so a chatty child never blocks on a full pipe.
        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;

        let mut cmd = Command::new(&self.exec_path);
        cmd.args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .env("TF_IN_AUTOMATION", "1");
        if let Some(workspace) = &self.workspace {
            cmd.env("TF_WORKSPACE", workspace);
        }

        let command = self.describe(args);
        tracing::debug!(command = %command, dir = %self.dir.display(), "running terraform");

        let mut child = cmd.spawn()?;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if ctx.is_cancelled() {
                tracing::warn!(command = %command, "cancellation requested, killing terraform");
                let _ = child.kill();
                let _ = child.wait();
                return Err(StateStoreError::Cancelled);
            }
            std::thread::sleep(self.poll_interval);
        };

        Ok(CommandOutput {
            command,
            status,
            stdout: read_all(&mut stdout)?,
            stderr: read_all(&mut stderr)?,
        })
    }

    /// Run a state-rewriting command against a scratch copy of `state`.
    ///
    /// `args` receives the path of the scratch state file and returns the
    /// full argument list.
    fn rewrite<F>(&self, ctx: &RunContext, state: &State, args: F) -> Result<State, StateStoreError>
    where
        F: FnOnce(&str, &str) -> Vec<String>,
    {
        let scratch = ScratchState::write(state)?;
        let argv = args(&scratch.state_arg(), &scratch.backup_arg());
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        self.run(ctx, &argv)?.into_checked()?;
        scratch.read()
    }
}

fn read_all(file: &mut File) -> Result<Vec<u8>, StateStoreError> {
    let mut buf = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// A snapshot materialized on disk for the duration of one command.
struct ScratchState {
    dir: TempDir,
}

impl ScratchState {
    fn write(state: &State) -> Result<Self, StateStoreError> {
        let dir = tempfile::Builder::new().prefix("tfshift").tempdir()?;
        fs::write(dir.path().join(STATE_FILE), state.bytes())?;
        Ok(Self { dir })
    }

    fn path(&self) -> PathBuf {
        self.dir.path().join(STATE_FILE)
    }

    fn state_arg(&self) -> String {
        format!("-state={}", self.path().display())
    }

    fn backup_arg(&self) -> String {
        format!("-backup={}", self.dir.path().join("backup.tfstate").display())
    }

    fn read(&self) -> Result<State, StateStoreError> {
        Ok(State::new(fs::read(self.path())?))
    }
}

impl StateStore for TerraformCli {
    fn pull(&self, ctx: &RunContext) -> Result<State, StateStoreError> {
        let stdout = self.run(ctx, &["state", "pull"])?.into_checked()?;
        Ok(State::new(stdout))
    }

    fn push(&self, ctx: &RunContext, state: &State) -> Result<(), StateStoreError> {
        let scratch = ScratchState::write(state)?;
        let path = scratch.path().display().to_string();
        self.run(ctx, &["state", "push", &path])?.into_checked()?;
        Ok(())
    }

    fn list(&self, ctx: &RunContext, state: &State) -> Result<Vec<String>, StateStoreError> {
        let scratch = ScratchState::write(state)?;
        let state_arg = scratch.state_arg();
        let stdout = self
            .run(ctx, &["state", "list", &state_arg])?
            .into_checked()?;
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn mv(
        &self,
        ctx: &RunContext,
        state: &State,
        source: &str,
        destination: &str,
    ) -> Result<State, StateStoreError> {
        self.rewrite(ctx, state, |state_arg, backup_arg| {
            vec![
                "state".into(),
                "mv".into(),
                "-lock=false".into(),
                state_arg.into(),
                backup_arg.into(),
                source.into(),
                destination.into(),
            ]
        })
    }

    fn rm(
        &self,
        ctx: &RunContext,
        state: &State,
        addresses: &[String],
    ) -> Result<State, StateStoreError> {
        self.rewrite(ctx, state, |state_arg, backup_arg| {
            let mut argv: Vec<String> = vec![
                "state".into(),
                "rm".into(),
                "-lock=false".into(),
                state_arg.into(),
                backup_arg.into(),
            ];
            argv.extend(addresses.iter().cloned());
            argv
        })
    }

    fn import(
        &self,
        ctx: &RunContext,
        state: &State,
        address: &str,
        id: &str,
    ) -> Result<State, StateStoreError> {
        self.rewrite(ctx, state, |state_arg, backup_arg| {
            vec![
                "import".into(),
                "-lock=false".into(),
                "-input=false".into(),
                "-no-color".into(),
                state_arg.into(),
                backup_arg.into(),
                address.into(),
                id.into(),
            ]
        })
    }

    fn plan(&self, ctx: &RunContext, state: &State) -> Result<PlanOutcome, StateStoreError> {
        let scratch = ScratchState::write(state)?;
        let state_arg = scratch.state_arg();
        let output = self.run(
            ctx,
            &[
                "plan",
                "-lock=false",
                "-input=false",
                "-no-color",
                "-detailed-exitcode",
                &state_arg,
            ],
        )?;
        // -detailed-exitcode: 0 no changes, 2 changes, anything else is an error.
        match output.status.code() {
            Some(0) => Ok(PlanOutcome::NoChanges),
            Some(2) => Ok(PlanOutcome::HasChanges),
            _ => Err(output.into_error()),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Install a shell script standing in for the terraform binary.
    fn fake_terraform(dir: &Path, body: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = dir.join(format!("terraform-{}", NEXT.fetch_add(1, Ordering::SeqCst)));
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_list_parses_lines() {
        let dir = tempfile::tempdir().unwrap();
        let exec = fake_terraform(dir.path(), "printf 'aws_instance.a\\n\\naws_instance.b\\n'");
        let tf = TerraformCli::new(exec, dir.path());

        let addresses = tf.list(&RunContext::new(), &State::new(b"{}".to_vec())).unwrap();
        assert_eq!(addresses, vec!["aws_instance.a", "aws_instance.b"]);
    }

    #[test]
    fn test_plan_detailed_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let state = State::new(b"{}".to_vec());

        let tf = TerraformCli::new(fake_terraform(dir.path(), "exit 2"), dir.path());
        assert_eq!(tf.plan(&RunContext::new(), &state).unwrap(), PlanOutcome::HasChanges);

        let tf = TerraformCli::new(fake_terraform(dir.path(), "exit 0"), dir.path());
        assert_eq!(tf.plan(&RunContext::new(), &state).unwrap(), PlanOutcome::NoChanges);

        let tf = TerraformCli::new(
            fake_terraform(dir.path(), "echo 'boom' >&2; exit 1"),
            dir.path(),
        );
        match tf.plan(&RunContext::new(), &state) {
            Err(StateStoreError::Command { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_mv_reads_back_rewritten_state() {
        let dir = tempfile::tempdir().unwrap();
        // Overwrite the file named by -state= with a marker.
        let exec = fake_terraform(
            dir.path(),
            "for a in \"$@\"; do case \"$a\" in -state=*) echo moved > \"${a#-state=}\";; esac; done",
        );
        let tf = TerraformCli::new(exec, dir.path());

        let state = State::new(b"original".to_vec());
        let moved = tf.mv(&RunContext::new(), &state, "a.x", "a.y").unwrap();
        assert_eq!(moved.bytes(), b"moved\n");
        assert_eq!(state.bytes(), b"original");
    }

    #[test]
    fn test_cancel_kills_running_command() {
        let dir = tempfile::tempdir().unwrap();
        let tf = TerraformCli::new(fake_terraform(dir.path(), "sleep 30"), dir.path())
            .with_poll_interval(Duration::from_millis(10));
        let ctx = RunContext::new();

        let canceller = ctx.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            canceller.cancel();
        });

        let result = tf.pull(&ctx);
        handle.join().unwrap();
        assert!(matches!(result, Err(StateStoreError::Cancelled)));
    }
}
