//! Internal implementation details for process execution.

pub mod resolve;
pub mod spawn;

pub use resolve::{ExecutableResolver, SearchPathResolver};
