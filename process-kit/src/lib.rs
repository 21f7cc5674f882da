//! Platform process kit - subprocess execution for Unix hosts.
//!
//! This crate spawns external programs with `posix_spawn`, optionally
//! captures their standard output and standard error, and waits for them
//! to exit without risking a full-pipe deadlock.
//!
//! # Features
//!
//! - **Deadlock-free capture**: stdout and stderr are drained concurrently on
//!   dedicated blocking threads before the child is reaped
//! - **Explicit lifecycle**: spawning twice or waiting before spawning are
//!   reported errors, not undefined behaviour
//! - **Faithful errors**: every OS failure keeps its `errno`
//! - **Raw exit status**: the `waitpid` status is kept as-is, with an
//!   optional decoder
//!
//! # Example
//!
//! ```rust,no_run
//! use process_kit::{ProcessHandle, ProcessOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ProcessOptions::new("uname")
//!     .with_arg("-s")
//!     .with_capture_output(true);
//!
//! let mut handle = ProcessHandle::from_options(options);
//! handle.spawn().await?;
//! let outcome = handle.wait().await?;
//! println!("{} ({})", outcome.output_text()?.trim(), outcome.status());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`types`] - Errors, options and outcomes
//! - [`internal`] - Spawn machinery (pipes, capture tasks, lifecycle, resolution)
//! - [`process`] - The [`ProcessHandle`] orchestrator

pub mod internal;
pub mod process;
pub mod types;

// Re-export all public types at the crate root for convenience
pub use internal::spawn::LifecycleState;
pub use internal::{ExecutableResolver, SearchPathResolver};
pub use process::ProcessHandle;
pub use types::*;
