//! Child process execution.
//!
//! Every external tool (tar, unzip, configure, make) runs through a
//! [`CommandRunner`]. A command is awaited to completion with both streams
//! fully captured; nothing is streamed and there is no timeout. Captured output
//! is appended to the run's shared `output` and `error` log files.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::consts::{STDERR_LOG_FILENAME, STDOUT_LOG_FILENAME};

#[derive(Debug, Error)]
pub enum ProcessError {
  /// The command ran and exited with a non-zero status (or was killed by a signal).
  #[error("command failed with exit code {code:?}: {command}")]
  CommandFailed {
    command: String,
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  #[error("failed to spawn {command}: {source}")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to open log file {path}: {source}")]
  OpenLog {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write log file {path}: {source}")]
  WriteLog {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
    self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
    self
  }

  /// The command as a single space-joined line, for logs and errors.
  pub fn command_line(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

#[derive(Debug)]
struct LogFile {
  path: PathBuf,
  file: File,
}

impl LogFile {
  async fn open(path: PathBuf) -> Result<Self, ProcessError> {
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .await
      .map_err(|source| ProcessError::OpenLog {
        path: path.clone(),
        source,
      })?;
    Ok(Self { path, file })
  }

  async fn append(&mut self, content: &str) -> Result<(), ProcessError> {
    if content.is_empty() {
      return Ok(());
    }
    let write_err = |source| ProcessError::WriteLog {
      path: self.path.clone(),
      source,
    };
    self.file.write_all(content.as_bytes()).await.map_err(write_err)?;
    // tokio hands writes to a background thread; flush before the next reader looks
    self.file.flush().await.map_err(write_err)
  }
}

/// Runs commands one at a time and records their output.
#[derive(Debug, Default)]
pub struct CommandRunner {
  stdout_log: Option<LogFile>,
  stderr_log: Option<LogFile>,
  invocations: usize,
}

impl CommandRunner {
  /// A runner that appends captured output to `<home>/output` and `<home>/error`.
  pub async fn with_logs(home: &Path) -> Result<Self, ProcessError> {
    Ok(Self {
      stdout_log: Some(LogFile::open(home.join(STDOUT_LOG_FILENAME)).await?),
      stderr_log: Some(LogFile::open(home.join(STDERR_LOG_FILENAME)).await?),
      invocations: 0,
    })
  }

  /// A runner that keeps captured output in memory only.
  pub fn detached() -> Self {
    Self::default()
  }

  /// Number of commands this runner has started.
  pub fn invocations(&self) -> usize {
    self.invocations
  }

  /// Run `spec` to completion.
  ///
  /// Returns [`ProcessError::CommandFailed`] carrying both captured streams when
  /// the exit status is not zero.
  pub async fn run(&mut self, spec: &CommandSpec) -> Result<CommandOutput, ProcessError> {
    let command_line = spec.command_line();
    self.invocations += 1;

    debug!(command = %command_line, cwd = ?spec.cwd, "running command");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).envs(&spec.env).stdin(Stdio::null());
    if let Some(cwd) = &spec.cwd {
      command.current_dir(cwd);
    }

    let output = command.output().await.map_err(|source| ProcessError::Spawn {
      command: command_line.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if let Some(log) = self.stdout_log.as_mut() {
      log.append(&stdout).await?;
    }
    if let Some(log) = self.stderr_log.as_mut() {
      log.append(&stderr).await?;
    }

    if !output.status.success() {
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      return Err(ProcessError::CommandFailed {
        command: command_line,
        code: output.status.code(),
        stdout,
        stderr,
      });
    }

    Ok(CommandOutput { stdout, stderr })
  }
}
