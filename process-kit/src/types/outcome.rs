//! Exit status and captured output of a finished process.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::types::{ProcessError, Result};

/// Raw wait status as reported by `waitpid`.
///
/// The integer is kept in the platform encoding. [`ExitStatus::kind`] is a
/// convenience decoder on top of it; [`ExitStatus::raw`] never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitStatus(i32);

/// Decoded form of an [`ExitStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Normal termination with the given exit code.
    Exited(i32),
    /// Terminated by the given signal.
    Signaled(i32),
    /// Stopped by the given signal.
    Stopped(i32),
    /// Any encoding not covered above.
    Other(i32),
}

impl ExitStatus {
    /// Wrap a raw wait status.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw platform wait status.
    pub fn raw(&self) -> i32 {
        self.0
    }

    pub fn kind(&self) -> ExitKind {
        let raw = self.0;
        if libc::WIFEXITED(raw) {
            ExitKind::Exited(libc::WEXITSTATUS(raw))
        } else if libc::WIFSIGNALED(raw) {
            ExitKind::Signaled(libc::WTERMSIG(raw))
        } else if libc::WIFSTOPPED(raw) {
            ExitKind::Stopped(libc::WSTOPSIG(raw))
        } else {
            ExitKind::Other(raw)
        }
    }

    /// Exit code, if the process terminated normally.
    pub fn code(&self) -> Option<i32> {
        match self.kind() {
            ExitKind::Exited(code) => Some(code),
            _ => None,
        }
    }

    /// Terminating signal, if the process was killed by one.
    pub fn signal(&self) -> Option<i32> {
        match self.kind() {
            ExitKind::Signaled(signal) => Some(signal),
            _ => None,
        }
    }

    /// Whether the process exited normally with code 0.
    pub fn success(&self) -> bool {
        self.code() == Some(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExitKind::Exited(code) => write!(f, "exit code: {}", code),
            ExitKind::Signaled(signal) => write!(f, "signal: {}", signal),
            ExitKind::Stopped(signal) => write!(f, "stopped by signal: {}", signal),
            ExitKind::Other(raw) => write!(f, "unrecognised wait status: {:#x}", raw),
        }
    }
}

/// Result of one capture task: the drained bytes or the task's error.
pub(crate) type CaptureResult = Result<Vec<u8>>;

/// Immutable record of a finished process.
///
/// Only [`ProcessHandle::wait`](crate::ProcessHandle::wait) builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    executable: PathBuf,
    arguments: Vec<String>,
    status: ExitStatus,
    output: Option<CaptureResult>,
    error: Option<CaptureResult>,
}

impl ProcessOutcome {
    pub(crate) fn new(
        executable: PathBuf,
        arguments: Vec<String>,
        status: ExitStatus,
        output: Option<CaptureResult>,
        error: Option<CaptureResult>,
    ) -> Self {
        Self {
            executable,
            arguments,
            status,
            output,
            error,
        }
    }

    /// Resolved path of the executable that ran.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments the process was started with, excluding the executable.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    /// Bytes captured from standard output.
    ///
    /// # Errors
    ///
    /// [`ProcessError::CaptureUnavailable`] if capture was disabled, or the
    /// drain task's own error if reading the pipe failed.
    pub fn output_bytes(&self) -> Result<&[u8]> {
        captured(&self.output)
    }

    /// Bytes captured from standard error. Fails like [`Self::output_bytes`].
    pub fn error_bytes(&self) -> Result<&[u8]> {
        captured(&self.error)
    }

    /// Standard output decoded as UTF-8.
    pub fn output_text(&self) -> Result<&str> {
        decode(self.output_bytes()?)
    }

    /// Standard error decoded as UTF-8.
    pub fn error_text(&self) -> Result<&str> {
        decode(self.error_bytes()?)
    }
}

fn captured(result: &Option<CaptureResult>) -> Result<&[u8]> {
    match result {
        None => Err(ProcessError::CaptureUnavailable),
        Some(Ok(bytes)) => Ok(bytes),
        Some(Err(e)) => Err(e.clone()),
    }
}

fn decode(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(ProcessError::NotUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(output: Option<CaptureResult>, error: Option<CaptureResult>) -> ProcessOutcome {
        ProcessOutcome::new(
            PathBuf::from("/bin/true"),
            vec![],
            ExitStatus::from_raw(0),
            output,
            error,
        )
    }

    #[test]
    fn test_exit_status_decoding() {
        // Linux/BSD encoding: exit code in the second byte, signal in the low 7 bits.
        let exited = ExitStatus::from_raw(3 << 8);
        assert_eq!(exited.kind(), ExitKind::Exited(3));
        assert_eq!(exited.code(), Some(3));
        assert!(!exited.success());
        assert_eq!(exited.raw(), 3 << 8);

        let killed = ExitStatus::from_raw(libc::SIGKILL);
        assert_eq!(killed.kind(), ExitKind::Signaled(libc::SIGKILL));
        assert_eq!(killed.signal(), Some(libc::SIGKILL));
        assert_eq!(killed.code(), None);

        assert!(ExitStatus::from_raw(0).success());
    }

    #[test]
    fn test_exit_status_display() {
        assert_eq!(ExitStatus::from_raw(2 << 8).to_string(), "exit code: 2");
        assert_eq!(ExitStatus::from_raw(libc::SIGTERM).to_string(), format!("signal: {}", libc::SIGTERM));
    }

    #[test]
    fn test_capture_disabled() {
        let outcome = outcome(None, None);
        assert_eq!(outcome.output_bytes(), Err(ProcessError::CaptureUnavailable));
        assert_eq!(outcome.error_text(), Err(ProcessError::CaptureUnavailable));
    }

    #[test]
    fn test_failed_capture_propagates_task_error() {
        let outcome = outcome(Some(Err(ProcessError::CaptureFailed(libc::EIO))), Some(Ok(vec![])));
        assert_eq!(outcome.output_bytes(), Err(ProcessError::CaptureFailed(libc::EIO)));
        assert_eq!(outcome.error_bytes(), Ok(&[][..]));
    }

    #[test]
    fn test_text_decoding() {
        let outcome = outcome(Some(Ok(b"hello\n".to_vec())), Some(Ok(vec![0xff, 0xfe])));
        assert_eq!(outcome.output_text(), Ok("hello\n"));
        assert!(matches!(outcome.error_text(), Err(ProcessError::NotUtf8(_))));
        assert_eq!(outcome.error_bytes(), Ok(&[0xff, 0xfe][..]));
    }
}
