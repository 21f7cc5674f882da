//! Native spawn machinery: encoders, pipes, capture tasks and lifecycle.

mod capture;
mod encode;
mod io_table;
mod lifecycle;
pub(crate) mod native;
mod pipe;

pub use capture::{CaptureStream, OutputCaptureTask};
pub use encode::{ProcessArguments, ProcessEnvironment};
pub use io_table::{FdAction, ProcessIOTable};
pub use lifecycle::{LifecycleState, ProcessLifecycle};
pub use pipe::PipeConduit;
