//! Frame timing.
//!
//! One `FrameClock` per render loop; `complete_frame()` is called once per
//! frame boundary and yields the index frame requests are resolved with.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
