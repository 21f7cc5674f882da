//! Type definitions for process execution.

pub mod error;
pub mod options;
pub mod outcome;

// Re-export commonly used types
pub use error::{ProcessError, Result};
pub use options::ProcessOptions;
pub use outcome::{ExitKind, ExitStatus, ProcessOutcome};
