//! Worker build-and-execute lifecycle
//!
//! The launcher runs on its own thread. It builds the worker with the
//! external build tool, reports `build_done`, waits until the coordinator
//! permits execution (the ingestion server must be listening by then), and
//! finally runs the worker binary pointed at the ingestion server.
//!
//! External commands go through the [`ProcessRunner`] trait so the lifecycle
//! can be exercised without a real toolchain. [`SystemRunner`] is the
//! `std::process` implementation.
//!
//! Any failure sets the `aborted` signal before returning, so no other thread
//! is left waiting on a signal that will never come.

use crate::backend::signal::LifecycleSynchronizer;
use crate::config::{AppConfig, ProjectLayout, WorkerConfig};
use crate::error::{Result, StreamError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A fully resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit code and wall-clock time of one finished process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub elapsed: Duration,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external command to completion.
///
/// Errors are reserved for commands that could not be started; a command
/// that ran and failed is reported through [`ProcessOutcome::exit_code`].
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutcome>;
}

/// [`ProcessRunner`] backed by `std::process::Command`. The child inherits
/// stdio so build and worker output show up in the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> Result<ProcessOutcome> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        let start = Instant::now();
        let status = cmd.status().map_err(|source| StreamError::Process {
            program: command.program.display().to_string(),
            source,
        })?;
        let elapsed = start.elapsed();

        Ok(ProcessOutcome {
            exit_code: exit_code(status),
            elapsed,
        })
    }
}

/// Map an exit status to a shell-style exit code; a process killed by a
/// signal reports 128 + signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Result of a successful build and worker run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchReport {
    pub build_elapsed: Duration,
    pub exit_code: i32,
    pub elapsed: Duration,
}

/// Builds and runs the external worker
pub struct WorkerLauncher {
    worker: WorkerConfig,
    layout: ProjectLayout,
    runner: Arc<dyn ProcessRunner>,
}

impl WorkerLauncher {
    pub fn new(worker: WorkerConfig, layout: ProjectLayout, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            worker,
            layout,
            runner,
        }
    }

    pub fn from_config(config: &AppConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self::new(config.worker.clone(), config.project.clone(), runner)
    }

    /// Path of the binary the build produces
    pub fn binary_path(&self) -> PathBuf {
        self.layout.binary_path(self.worker.target, self.worker.mode)
    }

    /// `<tool> --directory <root> --jobs <n> target=.. mode=.. logLevel=.. profile=.. <target>`
    pub fn build_command(&self) -> CommandLine {
        CommandLine::new(&self.layout.build_tool)
            .arg("--directory")
            .arg(self.layout.root.as_os_str())
            .arg("--jobs")
            .arg(self.layout.jobs.to_string())
            .arg(format!("target={}", self.worker.target))
            .arg(format!("mode={}", self.worker.mode))
            .arg(format!("logLevel={}", self.worker.log_level))
            .arg(format!("profile={}", self.worker.profile_flag()))
            .arg(&self.layout.build_target)
    }

    /// `<binary> <sequence> <algorithm> <address> <port>`
    pub fn worker_command(&self, address: &str, port: u16) -> CommandLine {
        let sequence = self.layout.resolve(&self.worker.sequence);
        CommandLine::new(self.binary_path())
            .arg(sequence.into_os_string())
            .arg(self.worker.algorithm.to_string())
            .arg(address)
            .arg(port.to_string())
    }

    /// Remove the build tree for the configured target/mode if a previous
    /// binary exists. Failures are logged and otherwise ignored.
    pub fn clean_previous_build(&self) {
        if !self.binary_path().is_file() {
            tracing::debug!("No previous build at {:?}, nothing to clean", self.binary_path());
            return;
        }

        let build_dir = self.layout.build_dir(self.worker.target, self.worker.mode);
        tracing::info!("Removing previous build {:?}", build_dir);
        if let Err(e) = std::fs::remove_dir_all(&build_dir) {
            tracing::warn!("Failed to remove {:?}: {}", build_dir, e);
        }
    }

    /// Build the worker, signal `build_done`, wait for permission, then run
    /// the worker against `address:port`.
    pub fn build_and_run(
        &self,
        address: &str,
        port: u16,
        sync: &LifecycleSynchronizer,
    ) -> Result<LaunchReport> {
        let result = self.build_and_run_inner(address, port, sync);
        if let Err(e) = &result {
            tracing::error!("{}. Exiting", e);
            sync.abort();
        }
        result
    }

    fn build_and_run_inner(
        &self,
        address: &str,
        port: u16,
        sync: &LifecycleSynchronizer,
    ) -> Result<LaunchReport> {
        if self.worker.rebuild {
            self.clean_previous_build();
        }

        let build = self.build_command();
        tracing::info!("{}", build);
        let built = self.runner.run(&build)?;
        if !built.success() {
            return Err(StreamError::BuildFailed {
                exit_code: built.exit_code,
            });
        }
        tracing::info!("Build finished in {:.2?}", built.elapsed);
        sync.set_build_done();

        crossbeam_channel::select! {
            recv(sync.execute_permitted().observer()) -> _ => {}
            recv(sync.aborted().observer()) -> _ => return Err(StreamError::Aborted),
        }

        let worker = self.worker_command(address, port);
        ensure_exists(&worker.program);
        tracing::info!("{}", worker);
        let ran = self.runner.run(&worker)?;
        if !ran.success() {
            return Err(StreamError::ExecuteFailed {
                exit_code: ran.exit_code,
            });
        }

        tracing::info!(
            "Worker finished in {:.3} seconds",
            ran.elapsed.as_secs_f64()
        );

        Ok(LaunchReport {
            build_elapsed: built.elapsed,
            exit_code: ran.exit_code,
            elapsed: ran.elapsed,
        })
    }
}

fn ensure_exists(binary: &Path) {
    if !binary.exists() {
        tracing::warn!("Worker binary {:?} does not exist after build", binary);
    }
}
