//! Cross-thread reply primitives.
//!
//! - `Completion`: one-shot reply handle carried from the control thread to
//!   the render thread and resolved there.
//! - `FrameSyncQueue`: "wake me after the next completed frame" requests,
//!   resolved in batches at each frame boundary.

mod completion;
mod frame_sync;

pub use completion::Completion;
pub use frame_sync::{FrameSyncQueue, FrameSyncRequest, FrameTicket};
