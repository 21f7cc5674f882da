//! Capture when the host process has its standard descriptors closed.
//!
//! Kept in its own test binary: closing stdin/stdout would disturb tests
//! running alongside it.

use std::collections::HashMap;

use process_kit::ProcessHandle;

/// Close `fds` while `task` runs, then put them back.
async fn with_closed<T>(fds: &[i32], task: impl Future<Output = T>) -> T {
    let saved: Vec<(i32, i32)> = fds
        .iter()
        .map(|&fd| {
            let copy = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 3) };
            assert!(copy >= 0);
            assert_eq!(unsafe { libc::close(fd) }, 0);
            (fd, copy)
        })
        .collect();

    let result = task.await;

    for (fd, copy) in saved {
        assert_eq!(unsafe { libc::dup2(copy, fd) }, fd);
        unsafe { libc::close(copy) };
    }
    result
}

#[tokio::test]
async fn test_capture_with_parent_stdin_and_stdout_closed() {
    let mut env = HashMap::new();
    env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
    let mut handle = ProcessHandle::new(
        "/bin/sh",
        vec!["-c".to_string(), "printf out; printf err >&2".to_string()],
        env,
        true,
    );

    let outcome = with_closed(&[libc::STDIN_FILENO, libc::STDOUT_FILENO], handle.run()).await;
    let outcome = outcome.unwrap();

    assert!(outcome.status().success());
    assert_eq!(outcome.output_text(), Ok("out"));
    assert_eq!(outcome.error_text(), Ok("err"));
}
