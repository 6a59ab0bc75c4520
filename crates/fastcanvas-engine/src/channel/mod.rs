//! Command channel between the control thread and the render thread.

mod operation;
mod queue;

pub use operation::PendingOperation;
pub use queue::CommandChannel;
