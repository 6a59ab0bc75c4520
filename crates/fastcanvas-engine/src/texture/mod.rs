//! Texture cache and loading.
//!
//! All types here are mutated on the render thread only:
//! - `TextureLoader` decodes an asset and uploads it (power-of-two padded)
//! - `TextureCache` owns every GPU handle and knows how to evict, unload
//!   and schedule reloads after context recreation
//! - `TextureBackend` is the GPU seam the loader allocates through

mod backend;
mod cache;
mod loader;
#[allow(clippy::module_inception)]
mod texture;

pub use backend::{GpuHandle, TextureBackend, TextureDesc};
pub use cache::{GpuResources, TextureCache};
pub use loader::{padded_size, TextureLoader};
pub use texture::{Texture, TextureId, TextureInfo, TextureSize, TextureSpec};
