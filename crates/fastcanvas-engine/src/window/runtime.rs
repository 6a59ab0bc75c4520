use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit};
use crate::raster::Rasterizer;
use crate::render::RenderLoop;
use crate::sync::Completion;
use crate::texture::TextureBackend;

use super::signal::{RenderSignal, SurfaceSignal};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// Pause after a cycle that presented nothing (no payload yet). With a
    /// payload, presentation paces the loop.
    pub idle_frame_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "fastcanvas".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            idle_frame_interval: Duration::from_millis(16),
        }
    }
}

/// GPU context handed to the render thread on surface creation.
pub trait RenderContext: Send + 'static {
    /// Texture backend allocating on this context's device.
    fn create_backend(&self) -> Box<dyn TextureBackend>;
}

impl RenderContext for Gpu {
    fn create_backend(&self) -> Box<dyn TextureBackend> {
        Box::new(self.texture_backend())
    }
}

/// A rasterizer that draws into a window's GPU context.
pub trait WindowRasterizer<C = Gpu>: Rasterizer + Send + 'static {
    /// Hands over a freshly created context. Any previous one is already
    /// gone (`context_lost` ran first).
    fn attach(&mut self, context: C);
}

/// Sent by the render thread when it stops on its own.
#[derive(Debug)]
enum RuntimeEvent {
    RenderThreadExited,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the window event loop on this thread and `render_loop` on a
    /// dedicated render thread until the window closes.
    pub fn run<R>(config: RuntimeConfig, gpu_init: GpuInit, render_loop: RenderLoop<R>) -> Result<()>
    where
        R: WindowRasterizer,
    {
        let event_loop = EventLoop::<RuntimeEvent>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;
        let proxy = event_loop.create_proxy();
        let mut state = AppState::new(config, gpu_init, render_loop, proxy);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.outcome
    }
}

struct RenderThread {
    signal: Arc<RenderSignal<Gpu>>,
    join: JoinHandle<crate::Result<()>>,
}

struct AppState<R: WindowRasterizer> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    proxy: EventLoopProxy<RuntimeEvent>,

    /// Moved onto the render thread when the first window appears.
    pending: Option<RenderLoop<R>>,
    render: Option<RenderThread>,
    window: Option<Arc<Window>>,

    outcome: Result<()>,
}

impl<R: WindowRasterizer> AppState<R> {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        render_loop: RenderLoop<R>,
        proxy: EventLoopProxy<RuntimeEvent>,
    ) -> Self {
        Self {
            config,
            gpu_init,
            proxy,
            pending: Some(render_loop),
            render: None,
            window: None,
            outcome: Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.outcome.is_ok() {
            self.outcome = Err(err);
        }
        self.shutdown(event_loop);
    }

    fn send(&self, signal: SurfaceSignal<Gpu>) {
        if let Some(render) = &self.render {
            log::debug!("surface signal: {}", signal.name());
            render.signal.send(signal);
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
        if let Some(window) = &self.window {
            return Ok(Arc::clone(window));
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        self.window = Some(Arc::clone(&window));
        Ok(window)
    }

    fn ensure_render_thread(&mut self) -> Result<()> {
        if self.render.is_some() {
            return Ok(());
        }
        let render_loop = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("render thread already ran"))?;

        let signal = Arc::new(RenderSignal::new());
        let thread_signal = Arc::clone(&signal);
        let idle = self.config.idle_frame_interval;
        let proxy = self.proxy.clone();

        let join = thread::Builder::new()
            .name("fastcanvas-render".into())
            .spawn(move || {
                let result = render_thread(render_loop, &thread_signal, idle);
                // The event loop may already be gone during shutdown.
                let _ = proxy.send_event(RuntimeEvent::RenderThreadExited);
                result
            })
            .context("failed to spawn render thread")?;

        self.render = Some(RenderThread { signal, join });
        Ok(())
    }

    /// Destroys the render side and waits for the render thread.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(render) = self.render.take() {
            render.signal.send(SurfaceSignal::Destroy);
            let result = match render.join.join() {
                Ok(result) => result.context("render thread failed"),
                Err(_) => Err(anyhow!("render thread panicked")),
            };
            if let Err(err) = result {
                log::error!("{err:#}");
                if self.outcome.is_ok() {
                    self.outcome = Err(err);
                }
            }
        }
        self.window = None;
        event_loop.exit();
    }
}

impl<R: WindowRasterizer> ApplicationHandler<RuntimeEvent> for AppState<R> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match self.ensure_window(event_loop) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, err),
        };
        if let Err(err) = self.ensure_render_thread() {
            return self.fail(event_loop, err);
        }

        match pollster::block_on(Gpu::new(window, self.gpu_init.clone())) {
            Ok(gpu) => self.send(SurfaceSignal::Create(gpu)),
            Err(err) => self.fail(event_loop, err.context("GPU initialization failed")),
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(render) = &self.render else {
            return;
        };
        // The native surface may be torn down once this returns, so wait
        // until the render thread has dropped its context.
        let (ack, released) = Completion::channel();
        log::debug!("surface signal: lose");
        render.signal.send(SurfaceSignal::Lose(ack));
        match released.recv() {
            Ok(Ok(())) => log::debug!("render context released"),
            Ok(Err(err)) => log::warn!("render thread did not release its context: {err}"),
            Err(_) => log::warn!("render thread went away during suspend"),
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: RuntimeEvent) {
        match event {
            RuntimeEvent::RenderThreadExited => {
                log::info!("render thread exited; shutting down");
                self.shutdown(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The render thread paces itself; nothing to poll here.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => self.send(SurfaceSignal::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.send(SurfaceSignal::Resize {
                        width: size.width,
                        height: size.height,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Closes the mailbox on the way out, after the render loop is gone.
struct CloseOnExit<'a, C>(&'a RenderSignal<C>);

impl<C> Drop for CloseOnExit<'_, C> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Runs [`drive`], then closes `signal` so nothing waits on a dead thread.
fn render_thread<C, R>(render_loop: RenderLoop<R>, signal: &RenderSignal<C>, idle: Duration) -> crate::Result<()>
where
    C: RenderContext,
    R: WindowRasterizer<C>,
{
    let _close = CloseOnExit(signal);
    drive(render_loop, signal, idle)
}

/// Render thread body.
///
/// Cycles continuously while active and sleeps on the signal otherwise.
/// Returns on `Destroy` or on a fatal error, after tearing the loop down.
fn drive<C, R>(mut render_loop: RenderLoop<R>, signal: &RenderSignal<C>, idle: Duration) -> crate::Result<()>
where
    C: RenderContext,
    R: WindowRasterizer<C>,
{
    let mut pending: Vec<SurfaceSignal<C>> = Vec::new();
    loop {
        for event in pending.drain(..) {
            match event {
                SurfaceSignal::Create(context) => {
                    render_loop.surface_created(context.create_backend())?;
                    render_loop.rasterizer_mut().attach(context);
                }
                SurfaceSignal::Lose(ack) => {
                    render_loop.context_lost()?;
                    ack.succeed(());
                }
                SurfaceSignal::Resize { width, height } => render_loop.surface_changed(width, height),
                SurfaceSignal::Destroy => return render_loop.destroy(),
            }
        }

        if !render_loop.is_active() {
            pending = signal.wait(None);
            continue;
        }

        match render_loop.draw_frame() {
            Ok(report) if !report.rendered => pending = signal.wait(Some(idle)),
            Ok(_) => pending = signal.drain(),
            Err(err) => {
                log::error!("render loop stopped: {err}");
                if let Err(teardown) = render_loop.destroy() {
                    log::warn!("teardown after failure: {teardown}");
                }
                return Err(err);
            }
        }
    }
}
