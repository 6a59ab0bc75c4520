//! Render thread.
//!
//! `RenderLoop` is the only consumer of the command channel and the only
//! place GPU calls are issued from. The platform runtime (see `window`)
//! decides when cycles run and forwards surface events.

mod render_loop;

pub use render_loop::{FrameReport, RenderLoop};
