//! FastCanvas engine crate.
//!
//! Bridges an asynchronous control layer to a GPU render loop:
//! - `bridge` is the control-thread API (`Bridge`, `Action`)
//! - `channel`, `sync` and `link` are the only state the two threads share
//! - `render`, `texture` and `lifecycle` run on the render thread
//! - `device` and `window` host the render thread on wgpu + winit

pub mod bridge;
pub mod channel;
pub mod color;
pub mod device;
pub mod error;
pub mod lifecycle;
pub mod link;
pub mod logging;
pub mod raster;
pub mod render;
pub mod storage;
pub mod sync;
pub mod texture;
pub mod time;
pub mod window;

#[cfg(test)]
mod testing;

pub use bridge::{connect, Action, ActionResult, Bridge};
pub use error::{Error, Result, TextureLoadError};
pub use render::{FrameReport, RenderLoop};
