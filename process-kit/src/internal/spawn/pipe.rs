//! Unidirectional OS pipe with independently closable ends.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use nix::fcntl::{FcntlArg, fcntl};
use nix::unistd;

use crate::types::{ProcessError, Result};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A pipe owned by the parent.
///
/// Both ends are close-on-exec and numbered above the standard descriptors;
/// a child only ever sees the copies that `posix_spawn` dup's onto its
/// standard descriptors. Once both ends are
/// closed the conduit is inert: closing again does nothing and reading
/// fails with `EBADF`.
#[derive(Debug)]
pub struct PipeConduit {
    read_end: Option<OwnedFd>,
    write_end: Option<OwnedFd>,
}

impl PipeConduit {
    pub fn open() -> Result<Self> {
        let open = || -> nix::Result<(OwnedFd, OwnedFd)> {
            let (read_end, write_end) = cloexec_pipe()?;
            Ok((above_stdio(read_end)?, above_stdio(write_end)?))
        };
        let (read_end, write_end) = open().map_err(|e| ProcessError::PipeOpenFailed(e as i32))?;
        Ok(Self {
            read_end: Some(read_end),
            write_end: Some(write_end),
        })
    }

    pub fn read_fd(&self) -> Option<RawFd> {
        self.read_end.as_ref().map(AsRawFd::as_raw_fd)
    }

    pub fn write_fd(&self) -> Option<RawFd> {
        self.write_end.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Close the read end. A second call is a no-op.
    pub fn close_read_end(&mut self) -> Result<()> {
        close(self.read_end.take())
    }

    /// Close the write end. A second call is a no-op.
    pub fn close_write_end(&mut self) -> Result<()> {
        close(self.write_end.take())
    }

    /// True once both ends are closed.
    pub fn is_inert(&self) -> bool {
        self.read_end.is_none() && self.write_end.is_none()
    }

    /// Read until end-of-stream and return every byte.
    ///
    /// Blocks until all writers have closed their ends, so the caller must
    /// already have closed (or handed off) its own write end. The read end
    /// is closed once end-of-stream is seen.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let fd = self
            .read_end
            .take()
            .ok_or(ProcessError::CaptureFailed(libc::EBADF))?;
        let mut reader = File::from(fd);
        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Put the descriptor back so the caller still owns it.
                    self.read_end = Some(OwnedFd::from(reader));
                    return Err(ProcessError::CaptureFailed(
                        e.raw_os_error().unwrap_or(libc::EIO),
                    ));
                }
            }
        }

        close(Some(OwnedFd::from(reader)))?;
        Ok(buffer)
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

// No pipe2 here: another thread may spawn between pipe() and fcntl() and
// leak these descriptors into its child.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn cloexec_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    use nix::fcntl::FdFlag;

    let (read_end, write_end) = unistd::pipe()?;
    for fd in [&read_end, &write_end] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    }
    Ok((read_end, write_end))
}

// With stdin/stdout/stderr closed in the parent a new pipe can land on 0-2.
// A dup2 onto itself would leave the close-on-exec flag set and the child
// would lose the stream, so such ends are moved to 3 or higher.
fn above_stdio(fd: OwnedFd) -> nix::Result<OwnedFd> {
    if fd.as_raw_fd() > libc::STDERR_FILENO {
        return Ok(fd);
    }
    let moved = fcntl(fd.as_raw_fd(), FcntlArg::F_DUPFD_CLOEXEC(libc::STDERR_FILENO + 1))?;
    Ok(unsafe { OwnedFd::from_raw_fd(moved) })
}

fn close(fd: Option<OwnedFd>) -> Result<()> {
    match fd {
        Some(fd) => {
            unistd::close(fd.into_raw_fd()).map_err(|e| ProcessError::PipeCloseFailed(e as i32))
        }
        None => Ok(()),
    }
}
