//! Background drain of one captured stream.

use std::fmt;

use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::pipe::PipeConduit;
use crate::types::{ProcessError, Result};

/// Which child stream a capture task drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStream {
    Stdout,
    Stderr,
}

impl fmt::Display for CaptureStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStream::Stdout => f.write_str("stdout"),
            CaptureStream::Stderr => f.write_str("stderr"),
        }
    }
}

enum TaskState {
    Running(JoinHandle<Result<Vec<u8>>>),
    Finished(Result<Vec<u8>>),
}

/// Drains a pipe to end-of-stream on its own blocking thread.
///
/// The task owns the conduit for its whole life. It runs exactly once;
/// [`join`](Self::join) caches the result so later calls never read again.
pub struct OutputCaptureTask {
    stream: CaptureStream,
    state: TaskState,
}

impl OutputCaptureTask {
    /// Start draining `conduit`.
    ///
    /// The parent's write end must already be closed. Must be called from
    /// within a tokio runtime.
    pub fn start(stream: CaptureStream, mut conduit: PipeConduit) -> Self {
        let handle = tokio::task::spawn_blocking(move || {
            let result = conduit.read_all();
            match &result {
                Ok(bytes) => trace!(%stream, bytes = bytes.len(), "capture drained"),
                Err(e) => trace!(%stream, error = %e, "capture failed"),
            }
            result
        });
        Self {
            stream,
            state: TaskState::Running(handle),
        }
    }

    pub fn stream(&self) -> CaptureStream {
        self.stream
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, TaskState::Finished(_))
    }

    /// Wait for the drain to complete and return its result.
    pub async fn join(&mut self) -> &Result<Vec<u8>> {
        if let TaskState::Running(handle) = &mut self.state {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(stream = %self.stream, error = %e, "capture task did not complete");
                    Err(ProcessError::CaptureFailed(libc::EIO))
                }
            };
            self.state = TaskState::Finished(result);
        }
        match &self.state {
            TaskState::Finished(result) => result,
            TaskState::Running(_) => unreachable!("capture task joined above"),
        }
    }

    /// Join, then move the result out.
    pub async fn into_result(mut self) -> Result<Vec<u8>> {
        self.join().await;
        match self.state {
            TaskState::Finished(result) => result,
            TaskState::Running(_) => unreachable!("capture task joined above"),
        }
    }
}
