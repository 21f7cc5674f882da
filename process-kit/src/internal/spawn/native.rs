//! Thin wrappers over `posix_spawn` and `waitpid`.

use std::ptr;

use nix::errno::Errno;

use super::encode::{ProcessArguments, ProcessEnvironment};
use super::io_table::ProcessIOTable;
use crate::types::{ProcessError, Result};

/// Start `argv[0]` with the given argv/envp, applying the IO table's
/// redirections if one is given.
///
/// Returns the child pid. Any failure, including building the file
/// actions, is reported as [`ProcessError::SpawnFailed`].
pub(crate) fn spawn(
    argv: &ProcessArguments,
    envp: &ProcessEnvironment,
    io_table: Option<&ProcessIOTable>,
) -> Result<libc::pid_t> {
    let failed = |code: i32| ProcessError::SpawnFailed {
        code,
        arguments: argv.to_strings(),
    };

    let file_actions = io_table.map(ProcessIOTable::file_actions).transpose().map_err(failed)?;
    let file_actions_ptr = file_actions.as_ref().map_or(ptr::null(), |fa| fa.as_ptr());

    let mut pid: libc::pid_t = 0;
    // posix_spawn returns the error number instead of setting errno.
    let rc = unsafe {
        libc::posix_spawn(
            &mut pid,
            argv.program().as_ptr(),
            file_actions_ptr,
            ptr::null(),
            argv.as_ptr(),
            envp.as_ptr(),
        )
    };
    if rc != 0 {
        return Err(failed(rc));
    }
    Ok(pid)
}

/// Block until `pid` exits and return its raw wait status.
///
/// `EINTR` is retried; any other error is [`ProcessError::WaitFailed`].
pub(crate) fn reap(pid: libc::pid_t) -> Result<i32> {
    loop {
        let mut status: libc::c_int = 0;
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc != -1 {
            return Ok(status);
        }
        match Errno::last() {
            Errno::EINTR => continue,
            errno => return Err(ProcessError::WaitFailed(errno as i32)),
        }
    }
}
