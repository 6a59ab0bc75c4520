use std::sync::Arc;
use std::time::Duration;

use crate::channel::PendingOperation;
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleCtx, LoopState, SurfaceLifecycle};
use crate::link::ControlLink;
use crate::raster::{GpuStatus, Rasterizer};
use crate::texture::{GpuResources, TextureBackend, TextureCache, TextureLoader};
use crate::time::FrameClock;

/// Outcome of one completed draw cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub operations_applied: usize,
    /// Whether the rasterizer was invoked (a payload has been submitted).
    pub rendered: bool,
    pub requests_resolved: usize,
    /// Time since the previous boundary.
    pub frame_time: Duration,
}

/// The render-thread side of the engine.
///
/// Owns the texture cache, the current texture backend and the rasterizer.
/// Each cycle drains the command channel, renders the latest payload and
/// then resolves frame requests. It never waits for commands; an idle
/// cycle re-renders the previous payload.
pub struct RenderLoop<R: Rasterizer> {
    link: Arc<ControlLink>,
    rasterizer: R,
    loader: TextureLoader,
    cache: TextureCache,
    backend: Option<Box<dyn TextureBackend>>,
    lifecycle: SurfaceLifecycle,
    payload: Option<String>,
    clock: FrameClock,
}

impl<R: Rasterizer> RenderLoop<R> {
    pub fn new(link: Arc<ControlLink>, loader: TextureLoader, rasterizer: R) -> Self {
        Self {
            link,
            rasterizer,
            loader,
            cache: TextureCache::new(),
            backend: None,
            lifecycle: SurfaceLifecycle::new(),
            payload: None,
            clock: FrameClock::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.lifecycle.state()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn link(&self) -> &Arc<ControlLink> {
        &self.link
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// A GPU context was (re)created; `backend` allocates on it.
    pub fn surface_created(&mut self, backend: Box<dyn TextureBackend>) -> Result<()> {
        self.lifecycle.create(LifecycleCtx {
            link: &self.link,
            cache: &mut self.cache,
            loader: &self.loader,
            backend: self.backend.as_mut(),
            rasterizer: &mut self.rasterizer,
        })?;
        self.backend = Some(backend);
        self.clock.reset();
        Ok(())
    }

    pub fn surface_changed(&mut self, width: u32, height: u32) {
        if self.is_active() {
            log::info!("surface changed: {width}x{height}");
            self.rasterizer.surface_changed(width, height);
        } else {
            log::debug!("surface change {width}x{height} ignored while {:?}", self.state());
        }
    }

    /// The GPU context is gone; its backend is dropped without GPU calls.
    pub fn context_lost(&mut self) -> Result<()> {
        let changed = self.lifecycle.lose(LifecycleCtx {
            link: &self.link,
            cache: &mut self.cache,
            loader: &self.loader,
            backend: None,
            rasterizer: &mut self.rasterizer,
        })?;
        if changed {
            self.backend = None;
        }
        Ok(())
    }

    /// Final teardown; cancels everything still pending. Idempotent.
    pub fn destroy(&mut self) -> Result<()> {
        self.lifecycle.destroy(LifecycleCtx {
            link: &self.link,
            cache: &mut self.cache,
            loader: &self.loader,
            backend: self.backend.as_mut(),
            rasterizer: &mut self.rasterizer,
        })?;
        self.backend = None;
        self.payload = None;
        Ok(())
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Runs one draw cycle.
    ///
    /// Calling this without a live context means lifecycle tracking is
    /// broken, which is fatal ([`Error::ContextExhausted`]).
    pub fn draw_frame(&mut self) -> Result<FrameReport> {
        if !self.is_active() || self.backend.is_none() {
            log::error!("draw requested while {:?} without a GPU context", self.state());
            return Err(Error::ContextExhausted);
        }

        let ops = self.link.commands.drain_all();
        let operations_applied = ops.len();
        if operations_applied > 0 {
            log::debug!("applying {operations_applied} queued operation(s)");
            for op in ops {
                self.apply(op);
            }
            self.check_gpu("queued operations")?;
        }

        if let Some(payload) = self.link.take_payload() {
            self.payload = Some(payload);
        }
        let rendered = match &self.payload {
            Some(payload) => {
                self.rasterizer.render(payload);
                true
            }
            None => false,
        };
        if rendered {
            self.check_gpu("render")?;
        }

        let frame = self.clock.complete_frame();
        let requests_resolved = self.link.frames.resolve_all_pending(frame.frame_index);
        log::trace!("frame {} completed after {:?}", frame.frame_index, frame.dt);

        Ok(FrameReport {
            frame_index: frame.frame_index,
            operations_applied,
            rendered,
            requests_resolved,
            frame_time: frame.dt,
        })
    }

    fn apply(&mut self, op: PendingOperation) {
        let Some(backend) = self.backend.as_mut() else {
            op.cancel();
            return;
        };
        let mut gpu = GpuResources {
            loader: &self.loader,
            backend: &mut **backend,
            rasterizer: &mut self.rasterizer,
        };

        match op {
            PendingOperation::Load {
                texture,
                completion,
            } => self.cache.load(texture, completion, &mut gpu),
            PendingOperation::Unload { id } => self.cache.unload(id, &mut gpu),
            PendingOperation::SetBackgroundColor(color) => {
                log::info!("background color: {color}");
                gpu.rasterizer.set_background_color(color);
            }
            PendingOperation::SetOrtho { width, height } => {
                log::info!("ortho: {width}x{height}");
                gpu.rasterizer.set_ortho(width, height);
            }
            PendingOperation::Capture {
                request_id,
                request,
                completion,
            } => match gpu.rasterizer.capture_region(request_id, &request) {
                Ok(()) => completion.succeed(request.destination),
                Err(err) => {
                    log::warn!("capture {request_id} failed: {err}");
                    completion.fail(err);
                }
            },
        }
    }

    fn check_gpu(&mut self, stage: &str) -> Result<()> {
        match self.rasterizer.check_error() {
            GpuStatus::Ok => Ok(()),
            GpuStatus::Error(code) => {
                log::warn!("GPU error after {stage}: 0x{code:x}");
                Ok(())
            }
            GpuStatus::ContextLost => {
                log::error!("GPU context lost during {stage} while active");
                Err(Error::ContextExhausted)
            }
        }
    }
}

impl<R: Rasterizer> Drop for RenderLoop<R> {
    fn drop(&mut self) {
        if self.state() != LoopState::Destroyed {
            if let Err(err) = self.destroy() {
                log::warn!("render loop teardown on drop failed: {err}");
            }
        }
    }
}
