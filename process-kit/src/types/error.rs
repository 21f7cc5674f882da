//! Error types for process execution.

use std::str::Utf8Error;

use nix::errno::Errno;
use thiserror::Error;

/// Errors surfaced by spawning, draining and reaping a child process.
///
/// OS failures keep the raw `errno` value so callers can match on it; the
/// `Display` form renders it through [`Errno`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The executable could not be resolved to an existing, executable file.
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    /// `posix_spawn` rejected the request.
    #[error("failed to spawn {arguments:?}: {}", errno(.code))]
    SpawnFailed { code: i32, arguments: Vec<String> },

    #[error("failed to open pipe: {}", errno(.0))]
    PipeOpenFailed(i32),

    #[error("failed to close pipe: {}", errno(.0))]
    PipeCloseFailed(i32),

    /// `spawn()` was called on a handle that already left the initial state.
    #[error("process has already been spawned")]
    AlreadySpawned,

    /// A drain task failed while reading its pipe.
    #[error("failed to capture output: {}", errno(.0))]
    CaptureFailed(i32),

    /// `waitpid` failed for a reason other than `EINTR`.
    #[error("failed to wait for process: {}", errno(.0))]
    WaitFailed(i32),

    /// `wait()` was called before a successful `spawn()`.
    #[error("no process has been spawned")]
    NoResult,

    /// Output was requested but capture was not enabled for this process.
    #[error("output capture was not enabled")]
    CaptureUnavailable,

    #[error("captured output is not valid UTF-8: {0}")]
    NotUtf8(#[source] Utf8Error),

    /// An argument, environment entry or configuration value cannot be
    /// passed to the native spawn call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ProcessError {
    /// The raw OS error code carried by this error, if any.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            ProcessError::SpawnFailed { code, .. } => Some(*code),
            ProcessError::PipeOpenFailed(code)
            | ProcessError::PipeCloseFailed(code)
            | ProcessError::CaptureFailed(code)
            | ProcessError::WaitFailed(code) => Some(*code),
            _ => None,
        }
    }
}

fn errno(code: &i32) -> Errno {
    Errno::from_raw(*code)
}

/// Result type for process operations.
pub type Result<T> = std::result::Result<T, ProcessError>;
