use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface;
use super::{GpuFrame, GpuInit, SurfaceErrorAction, WgpuTextureBackend};

/// One GPU context: wgpu core objects plus the window surface.
///
/// The window is shared, so a context can be created on the event-loop
/// thread and moved to the render thread. A context is never revived: when
/// the device is lost, the owner drops it and creates a new one.
pub struct Gpu {
    window: Arc<Window>,

    surface: wgpu::Surface<'static>,

    adapter: wgpu::Adapter,

    device: wgpu::Device,

    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Set by wgpu's device-lost callback, possibly from another thread.
    device_lost: Arc<AtomicBool>,
}

impl Gpu {
    /// Creates a GPU context bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let max_texture_side = init.max_texture_side();
        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            power_preference,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!(
            "GPU adapter: {} ({:?}); textures up to {max_texture_side}px",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fastcanvas device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let device_lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&device_lost);
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("GPU device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&surface_caps, prefer_srgb)
            .context("no supported surface formats")?;

        let alpha_mode = surface::choose_alpha_mode(&surface_caps, alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            config,
            size,
            device_lost,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// True once wgpu reported the device as lost.
    pub fn is_device_lost(&self) -> bool {
        self.device_lost.load(Ordering::Acquire)
    }

    /// A texture backend allocating on this context.
    pub fn texture_backend(&self) -> WgpuTextureBackend {
        WgpuTextureBackend::new(self.device.clone(), self.queue.clone())
    }

    /// Reconfigures the surface after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fastcanvas frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }
}
