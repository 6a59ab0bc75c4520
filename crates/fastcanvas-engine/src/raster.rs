//! Contract with the native rasterizer.
//!
//! The rasterizer interprets render-command payloads and issues the actual
//! draw calls. It is only ever called from the render thread.

use std::path::PathBuf;

use crate::color::Rgb;
use crate::error::Result;
use crate::texture::{TextureId, TextureInfo};

/// GPU status read back after a rasterizer call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GpuStatus {
    Ok,
    /// Backend-specific error code; logged, rendering continues.
    Error(u32),
    /// The context is gone.
    ContextLost,
}

/// Framebuffer region to encode to a file.
///
/// `None` extents mean "to the edge of the surface".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub x: u32,
    pub y: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub destination: PathBuf,
}

impl CaptureRequest {
    /// Clamps the request to a `surface_width × surface_height` surface.
    ///
    /// Returns `(x, y, width, height)`; empty when the origin is off-surface.
    pub fn clamp_to(&self, surface_width: u32, surface_height: u32) -> (u32, u32, u32, u32) {
        let x = self.x.min(surface_width);
        let y = self.y.min(surface_height);
        let max_w = surface_width - x;
        let max_h = surface_height - y;
        let w = self.width.map_or(max_w, |w| w.min(max_w));
        let h = self.height.map_or(max_h, |h| h.min(max_h));
        (x, y, w, h)
    }
}

/// Native rasterizer consumed by the render loop.
pub trait Rasterizer {
    /// Draws one frame from `payload`.
    fn render(&mut self, payload: &str);

    fn set_background_color(&mut self, color: Rgb);

    /// Sets the orthographic projection to `width × height` units.
    fn set_ortho(&mut self, width: u32, height: u32);

    fn add_texture(&mut self, id: TextureId, info: &TextureInfo);

    fn remove_texture(&mut self, id: TextureId);

    /// The GPU context is gone; drop driver-side state.
    fn context_lost(&mut self);

    fn surface_changed(&mut self, width: u32, height: u32);

    /// Encodes a framebuffer region to `request.destination`.
    fn capture_region(&mut self, request_id: u64, request: &CaptureRequest) -> Result<()>;

    /// Final teardown of native resources.
    fn release(&mut self);

    /// Reads and clears the GPU error state.
    fn check_error(&mut self) -> GpuStatus {
        GpuStatus::Ok
    }
}

impl<R: Rasterizer + ?Sized> Rasterizer for Box<R> {
    fn render(&mut self, payload: &str) {
        (**self).render(payload)
    }
    fn set_background_color(&mut self, color: Rgb) {
        (**self).set_background_color(color)
    }
    fn set_ortho(&mut self, width: u32, height: u32) {
        (**self).set_ortho(width, height)
    }
    fn add_texture(&mut self, id: TextureId, info: &TextureInfo) {
        (**self).add_texture(id, info)
    }
    fn remove_texture(&mut self, id: TextureId) {
        (**self).remove_texture(id)
    }
    fn context_lost(&mut self) {
        (**self).context_lost()
    }
    fn surface_changed(&mut self, width: u32, height: u32) {
        (**self).surface_changed(width, height)
    }
    fn capture_region(&mut self, request_id: u64, request: &CaptureRequest) -> Result<()> {
        (**self).capture_region(request_id, request)
    }
    fn release(&mut self) {
        (**self).release()
    }
    fn check_error(&mut self) -> GpuStatus {
        (**self).check_error()
    }
}
