//! Command execution for the publish step
//!
//! The plugin never talks to a shell. Programs are started with
//! `tokio::process::Command`, arguments are passed as a vector, and the
//! credential travels only through the child's environment.
//!
//! # Example
//!
//! ```rust,no_run
//! use hex_publisher::security::{CommandExecutor, SystemCommandExecutor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let executor = SystemCommandExecutor;
//! let output = executor
//!     .run(&CancellationToken::new(), "mix", &["--version".to_string()], &[], ".")
//!     .await
//!     .unwrap();
//! println!("{}", String::from_utf8_lossy(&output));
//! # }
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::io;
use std::process::Stdio;
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during command execution
///
/// Every variant except `Spawn` carries the combined output captured before
/// the failure.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The program could not be started (not found, permission denied)
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Reading the child's output or waiting on it failed
    #[error("failed to collect command output: {source}")]
    Io {
        #[source]
        source: io::Error,
        output: Vec<u8>,
    },

    /// The process ran and exited unsuccessfully
    #[error("{}", describe_exit(.code))]
    ExitStatus { code: Option<i32>, output: Vec<u8> },

    /// The invocation was cancelled and the child was killed
    #[error("command cancelled before completion")]
    Cancelled { output: Vec<u8> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl CommandError {
    /// Output captured before the failure (empty when nothing ran)
    pub fn output(&self) -> &[u8] {
        match self {
            Self::Spawn { .. } => &[],
            Self::Io { output, .. }
            | Self::ExitStatus { output, .. }
            | Self::Cancelled { output } => output,
        }
    }
}

/// Runs an external program and captures its combined output
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` in `dir` (current directory when empty).
    ///
    /// `env` is overlaid on top of the inherited environment. On success the
    /// combined stdout/stderr is returned; on failure the same bytes are
    /// available through [`CommandError::output`].
    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &str,
        args: &[String],
        env: &[(String, SecretString)],
        dir: &str,
    ) -> Result<Vec<u8>, CommandError>;
}

/// Production executor backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandExecutor;

/// Read the next chunk from a pipe, or wait forever once it is closed
async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &str,
        args: &[String],
        env: &[(String, SecretString)],
        dir: &str,
    ) -> Result<Vec<u8>, CommandError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in env {
            command.env(key, value.expose_secret());
        }

        if !dir.is_empty() {
            command.current_dir(dir);
        }

        log::debug!("spawning {} {} in '{}'", program, args.join(" "), dir);

        let mut child = command.spawn().map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut output = Vec::new();
        let mut out_buf = [0u8; 8192];
        let mut err_buf = [0u8; 8192];

        // Drain both pipes into one buffer in arrival order
        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let Err(e) = child.kill().await {
                        log::warn!("failed to kill {}: {}", program, e);
                    }
                    return Err(CommandError::Cancelled { output });
                }
                read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match read {
                    Ok(0) => stdout = None,
                    Ok(n) => output.extend_from_slice(&out_buf[..n]),
                    Err(source) => return Err(CommandError::Io { source, output }),
                },
                read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match read {
                    Ok(0) => stderr = None,
                    Ok(n) => output.extend_from_slice(&err_buf[..n]),
                    Err(source) => return Err(CommandError::Io { source, output }),
                },
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    log::warn!("failed to kill {}: {}", program, e);
                }
                return Err(CommandError::Cancelled { output });
            }
            status = child.wait() => match status {
                Ok(status) => status,
                Err(source) => return Err(CommandError::Io { source, output }),
            },
        };

        if status.success() {
            Ok(output)
        } else {
            Err(CommandError::ExitStatus {
                code: status.code(),
                output,
            })
        }
    }
}

/// A call captured by [`RecordingExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    /// Environment overrides with their values exposed
    pub env: Vec<(String, String)>,
    pub dir: String,
}

#[derive(Debug, Clone)]
enum ScriptedReply {
    Success(Vec<u8>),
    Failure { code: Option<i32>, output: Vec<u8> },
}

/// Executor double that records invocations instead of running them
///
/// A call made with an already-cancelled token is recorded and then fails
/// with [`CommandError::Cancelled`], like a killed child.
#[derive(Debug)]
pub struct RecordingExecutor {
    reply: ScriptedReply,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::succeeding("mock output")
    }
}

impl RecordingExecutor {
    /// Every call succeeds with `output`
    pub fn succeeding(output: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: ScriptedReply::Success(output.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call exits with `code` after printing `output`
    pub fn failing(code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: ScriptedReply::Failure {
                code: Some(code),
                output: output.into(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls recorded so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.to_vec()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(
        &self,
        cancel: &CancellationToken,
        program: &str,
        args: &[String],
        env: &[(String, SecretString)],
        dir: &str,
    ) -> Result<Vec<u8>, CommandError> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            env: env
                .iter()
                .map(|(k, v)| (k.clone(), v.expose_secret().to_string()))
                .collect(),
            dir: dir.to_string(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }

        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled { output: Vec::new() });
        }

        match &self.reply {
            ScriptedReply::Success(output) => Ok(output.clone()),
            ScriptedReply::Failure { code, output } => Err(CommandError::ExitStatus {
                code: *code,
                output: output.clone(),
            }),
        }
    }
}
