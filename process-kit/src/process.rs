//! Process handle: spawn a child, capture its output, wait for it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future;
use tracing::debug;

use crate::internal::resolve::{ExecutableResolver, SearchPathResolver};
use crate::internal::spawn::{
    CaptureStream, LifecycleState, OutputCaptureTask, ProcessArguments, ProcessEnvironment,
    ProcessIOTable, ProcessLifecycle, native,
};
use crate::types::{ExitStatus, ProcessError, ProcessOptions, ProcessOutcome, Result};

/// The two drain tasks of a capturing spawn.
struct Captures {
    stdout: OutputCaptureTask,
    stderr: OutputCaptureTask,
}

/// Handle for one run of an external program.
///
/// A handle spawns at most once. [`spawn`](Self::spawn) starts the child and,
/// when capture is enabled, one drain task per output stream.
/// [`wait`](Self::wait) joins the drains, reaps the child and stores the
/// [`ProcessOutcome`]; later calls return the stored outcome.
///
/// # Example
///
/// ```rust,no_run
/// use std::collections::HashMap;
/// use process_kit::ProcessHandle;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut handle = ProcessHandle::new("echo", vec!["hello".into()], HashMap::new(), true);
///     handle.spawn().await?;
///
///     let outcome = handle.wait().await?;
///     assert!(outcome.status().success());
///     assert_eq!(outcome.output_text()?, "hello\n");
///     Ok(())
/// }
/// ```
pub struct ProcessHandle {
    executable: String,
    arguments: Vec<String>,
    environment: HashMap<String, String>,
    capture_output: bool,
    resolver: Arc<dyn ExecutableResolver>,
    resolved: Option<PathBuf>,
    pid: Option<libc::pid_t>,
    lifecycle: ProcessLifecycle,
    captures: Option<Captures>,
    outcome: Option<ProcessOutcome>,
}

impl ProcessHandle {
    /// Create a handle.
    ///
    /// `environment` is the child's complete environment. Nothing runs until
    /// [`spawn`](Self::spawn) is called.
    pub fn new(
        executable: impl Into<String>,
        arguments: Vec<String>,
        environment: HashMap<String, String>,
        capture_output: bool,
    ) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            environment,
            capture_output,
            resolver: Arc::new(SearchPathResolver),
            resolved: None,
            pid: None,
            lifecycle: ProcessLifecycle::new(),
            captures: None,
            outcome: None,
        }
    }

    pub fn from_options(options: ProcessOptions) -> Self {
        Self::new(
            options.executable,
            options.arguments,
            options.environment,
            options.capture_output,
        )
    }

    /// Replace the executable resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ExecutableResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Start the child process.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::ExecutableNotFound`] if the executable does not
    ///   resolve; nothing is spawned and the handle stays initial.
    /// - [`ProcessError::AlreadySpawned`] on a second call.
    /// - [`ProcessError::InvalidArgument`] for arguments or environment
    ///   entries the OS cannot accept.
    /// - [`ProcessError::PipeOpenFailed`] or [`ProcessError::SpawnFailed`]
    ///   for OS failures before the child exists. The handle is then
    ///   unusable; build a new one to retry.
    /// - [`ProcessError::PipeCloseFailed`] if the parent's write ends cannot
    ///   be closed. The child is already running: [`wait`](Self::wait) still
    ///   reaps it, but its output is reported as not captured.
    pub async fn spawn(&mut self) -> Result<()> {
        let executable = self
            .resolver
            .resolve(&self.executable)
            .ok_or_else(|| ProcessError::ExecutableNotFound(self.executable.clone()))?;

        self.lifecycle.enter_spawning()?;

        let argv = ProcessArguments::encode(&executable, &self.arguments)?;
        let envp = ProcessEnvironment::encode(&self.environment)?;
        let io_table = if self.capture_output {
            Some(ProcessIOTable::open()?)
        } else {
            None
        };

        let pid = native::spawn(&argv, &envp, io_table.as_ref())?;
        self.pid = Some(pid);
        self.resolved = Some(executable);
        debug!(
            pid,
            executable = %self.executable,
            capture = self.capture_output,
            "process spawned"
        );

        // The child exists from here on; wait() must be able to reap it.
        self.lifecycle.enter_spawned();

        if let Some(mut io_table) = io_table {
            io_table.close_parent_write_ends()?;
            let (stdout, stderr) = io_table.into_conduits();
            self.captures = Some(Captures {
                stdout: OutputCaptureTask::start(CaptureStream::Stdout, stdout),
                stderr: OutputCaptureTask::start(CaptureStream::Stderr, stderr),
            });
        }
        Ok(())
    }

    /// Wait for the child to finish and return its outcome.
    ///
    /// Captured output is drained to end-of-stream before the child is
    /// reaped. Once finished, further calls return the same outcome.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::NoResult`] if nothing was spawned.
    /// - [`ProcessError::WaitFailed`] if `waitpid` fails.
    pub async fn wait(&mut self) -> Result<&ProcessOutcome> {
        if self.lifecycle.state() == LifecycleState::Finished {
            return self.outcome.as_ref().ok_or(ProcessError::NoResult);
        }
        let pid = match (self.lifecycle.state(), self.pid) {
            (LifecycleState::Spawned, Some(pid)) => pid,
            _ => return Err(ProcessError::NoResult),
        };

        if let Some(captures) = self.captures.as_mut() {
            future::join(captures.stdout.join(), captures.stderr.join()).await;
        }

        let raw = tokio::task::spawn_blocking(move || native::reap(pid))
            .await
            .map_err(|_| ProcessError::WaitFailed(libc::EIO))??;
        let status = ExitStatus::from_raw(raw);
        debug!(pid, raw, %status, "process reaped");

        let (output, error) = match self.captures.take() {
            Some(Captures { stdout, stderr }) => {
                (Some(stdout.into_result().await), Some(stderr.into_result().await))
            }
            None => (None, None),
        };

        let executable = self
            .resolved
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.executable));
        let outcome = ProcessOutcome::new(executable, self.arguments.clone(), status, output, error);
        self.lifecycle.enter_finished();
        Ok(&*self.outcome.insert(outcome))
    }

    /// Spawn, wait, and return an owned copy of the outcome.
    pub async fn run(&mut self) -> Result<ProcessOutcome> {
        self.spawn().await?;
        self.wait().await.cloned()
    }

    /// Child process ID, once spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid.map(|pid| pid as u32)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// The executable as given at construction.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// The path that was spawned, once spawned.
    pub fn resolved_executable(&self) -> Option<&Path> {
        self.resolved.as_deref()
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }

    pub fn captures_output(&self) -> bool {
        self.capture_output
    }

    /// The stored outcome, once [`wait`](Self::wait) has succeeded.
    pub fn outcome(&self) -> Option<&ProcessOutcome> {
        self.outcome.as_ref()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("executable", &self.executable)
            .field("arguments", &self.arguments)
            .field("capture_output", &self.capture_output)
            .field("pid", &self.pid)
            .field("state", &self.lifecycle.state())
            .finish_non_exhaustive()
    }
}
