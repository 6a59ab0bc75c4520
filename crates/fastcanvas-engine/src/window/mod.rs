//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window on the main thread and runs the
//! render loop on its own thread. Platform surface events become lifecycle
//! signals for the render thread.

mod runtime;
mod signal;

pub use runtime::{RenderContext, Runtime, RuntimeConfig, WindowRasterizer};
pub use signal::{RenderSignal, SurfaceSignal};
