//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for a window
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - the wgpu-backed `TextureBackend` used by the texture cache

mod context;
mod error;
mod frame;
mod init;
mod surface;
mod textures;

pub use context::Gpu;
pub use error::{SurfaceErrorAction, SURFACE_OUT_OF_MEMORY};
pub use frame::GpuFrame;
pub use init::GpuInit;
pub use textures::{GpuTexture, WgpuTextureBackend};
