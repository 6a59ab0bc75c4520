//! Control-layer bridge.
//!
//! Host calls arrive as `(name, json args)`, are decoded into an [`Action`]
//! once, and are forwarded to the render thread through the shared link.

mod action;
mod control;

pub use action::{Action, ActionResult};
pub use control::{connect, Bridge};
