//! Pipes for stdout/stderr capture and the matching spawn-time fd actions.

use std::mem::MaybeUninit;
use std::os::fd::RawFd;

use super::pipe::PipeConduit;
use crate::types::Result;

/// One file-descriptor instruction executed in the child before exec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdAction {
    /// `dup2(fd, target)`.
    Dup2 { fd: RawFd, target: RawFd },
    /// `close(fd)`.
    Close { fd: RawFd },
}

/// The stdout and stderr pipes of one spawn.
#[derive(Debug)]
pub struct ProcessIOTable {
    stdout: PipeConduit,
    stderr: PipeConduit,
}

impl ProcessIOTable {
    pub fn open() -> Result<Self> {
        Ok(Self {
            stdout: PipeConduit::open()?,
            stderr: PipeConduit::open()?,
        })
    }

    /// Redirections the child performs before exec.
    ///
    /// The write ends are dup'd onto descriptors 1 and 2, then every pipe
    /// descriptor the child inherited is closed. Pipe ends never use 0-2, so
    /// no close can undo a redirection.
    ///
    /// ```text
    /// dup2(stdout.w, 1); dup2(stderr.w, 2);
    /// close(stdout.w); close(stderr.w); close(stdout.r); close(stderr.r)
    /// ```
    pub fn actions(&self) -> Vec<FdAction> {
        let mut actions = Vec::new();
        let mut closes = Vec::new();

        for (pipe, target) in [(&self.stdout, libc::STDOUT_FILENO), (&self.stderr, libc::STDERR_FILENO)] {
            if let Some(fd) = pipe.write_fd() {
                actions.push(FdAction::Dup2 { fd, target });
                closes.push(FdAction::Close { fd });
            }
        }
        for pipe in [&self.stdout, &self.stderr] {
            if let Some(fd) = pipe.read_fd() {
                closes.push(FdAction::Close { fd });
            }
        }

        actions.extend(closes);
        actions
    }

    /// Native file actions built from [`Self::actions`].
    ///
    /// On failure the raw error number returned by libc is handed back.
    pub(crate) fn file_actions(&self) -> std::result::Result<SpawnFileActions, i32> {
        let mut file_actions = SpawnFileActions::new()?;
        for action in self.actions() {
            file_actions.push(action)?;
        }
        Ok(file_actions)
    }

    /// Close the parent's copies of both write ends. Must happen after the
    /// spawn and before draining, or end-of-stream is never observed.
    pub fn close_parent_write_ends(&mut self) -> Result<()> {
        self.stdout.close_write_end()?;
        self.stderr.close_write_end()
    }

    /// Hand the conduits over as `(stdout, stderr)`.
    pub fn into_conduits(self) -> (PipeConduit, PipeConduit) {
        (self.stdout, self.stderr)
    }
}

/// Owned `posix_spawn_file_actions_t`, destroyed on drop.
///
/// Boxed so the initialised object never moves.
pub(crate) struct SpawnFileActions {
    inner: Box<MaybeUninit<libc::posix_spawn_file_actions_t>>,
}

impl SpawnFileActions {
    fn new() -> std::result::Result<Self, i32> {
        let mut inner = Box::new(MaybeUninit::uninit());
        let rc = unsafe { libc::posix_spawn_file_actions_init(inner.as_mut_ptr()) };
        if rc != 0 {
            return Err(rc);
        }
        Ok(Self { inner })
    }

    fn push(&mut self, action: FdAction) -> std::result::Result<(), i32> {
        let ptr = self.inner.as_mut_ptr();
        let rc = match action {
            FdAction::Dup2 { fd, target } => unsafe {
                libc::posix_spawn_file_actions_adddup2(ptr, fd, target)
            },
            FdAction::Close { fd } => unsafe { libc::posix_spawn_file_actions_addclose(ptr, fd) },
        };
        if rc != 0 { Err(rc) } else { Ok(()) }
    }

    pub(crate) fn as_ptr(&self) -> *const libc::posix_spawn_file_actions_t {
        self.inner.as_ptr()
    }
}

impl Drop for SpawnFileActions {
    fn drop(&mut self) {
        unsafe {
            libc::posix_spawn_file_actions_destroy(self.inner.as_mut_ptr());
        }
    }
}
