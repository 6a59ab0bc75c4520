use std::collections::HashMap;

use fastcanvas_engine::color::Rgb;
use fastcanvas_engine::device::Gpu;
use fastcanvas_engine::raster::{CaptureRequest, GpuStatus, Rasterizer};
use fastcanvas_engine::texture::{TextureId, TextureInfo};
use fastcanvas_engine::window::WindowRasterizer;
use fastcanvas_engine::{Error, Result};
use winit::dpi::PhysicalSize;

/// Minimal rasterizer: every rendered frame is the background colour.
///
/// Payloads are not interpreted. Textures are tracked so their lifecycle
/// shows up in the log.
#[derive(Default)]
pub struct ClearRasterizer {
    gpu: Option<Gpu>,
    background: Rgb,
    ortho: Option<(u32, u32)>,
    surface: (u32, u32),
    textures: HashMap<TextureId, TextureInfo>,
    frames: u64,
    status: Option<GpuStatus>,
}

impl ClearRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let mut frame = match gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let action = gpu.handle_surface_error(err);
                log::debug!("frame skipped: {action:?}");
                match action.status() {
                    GpuStatus::Ok => {}
                    status => self.status = Some(status),
                }
                return;
            }
        };

        frame.clear(self.background);
        gpu.submit(frame);
    }
}

impl Rasterizer for ClearRasterizer {
    fn render(&mut self, payload: &str) {
        self.frames += 1;
        if self.frames == 1 {
            log::info!("first frame ({} byte payload)", payload.len());
        }
        self.clear();
    }

    fn set_background_color(&mut self, color: Rgb) {
        self.background = color;
    }

    fn set_ortho(&mut self, width: u32, height: u32) {
        self.ortho = Some((width, height));
    }

    fn add_texture(&mut self, id: TextureId, info: &TextureInfo) {
        log::debug!(
            "texture {id}: {}x{} in {}x{}",
            info.width,
            info.height,
            info.storage_width,
            info.storage_height
        );
        self.textures.insert(id, *info);
    }

    fn remove_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }

    fn context_lost(&mut self) {
        self.gpu = None;
        self.textures.clear();
    }

    fn surface_changed(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(PhysicalSize::new(width, height));
        }
    }

    fn capture_region(&mut self, request_id: u64, request: &CaptureRequest) -> Result<()> {
        let (surface_w, surface_h) = self.surface;
        let (_, _, width, height) = request.clamp_to(surface_w, surface_h);
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!(
                "capture {request_id}: empty region on {surface_w}x{surface_h} surface"
            )));
        }

        let Rgb { r, g, b } = self.background;
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255]));
        image
            .save_with_format(&request.destination, image::ImageFormat::Png)
            .map_err(|e| Error::Io(format!("{}: {e}", request.destination.display())))?;

        log::info!(
            "capture {request_id}: {width}x{height} -> {}",
            request.destination.display()
        );
        Ok(())
    }

    fn release(&mut self) {
        self.gpu = None;
        self.textures.clear();
        log::info!(
            "rasterizer released after {} frame(s); last ortho {:?}",
            self.frames,
            self.ortho
        );
    }

    fn check_error(&mut self) -> GpuStatus {
        if self.gpu.as_ref().is_some_and(Gpu::is_device_lost) {
            return GpuStatus::ContextLost;
        }
        self.status.take().unwrap_or(GpuStatus::Ok)
    }
}

impl WindowRasterizer for ClearRasterizer {
    fn attach(&mut self, gpu: Gpu) {
        let size = gpu.size();
        log::info!(
            "rasterizer attached: {}x{} {:?}",
            size.width,
            size.height,
            gpu.surface_format()
        );
        self.surface = (size.width, size.height);
        self.gpu = Some(gpu);
    }
}
