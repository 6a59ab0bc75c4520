use crate::error::{Error, Result};
use crate::link::ControlLink;
use crate::raster::Rasterizer;
use crate::texture::{GpuResources, TextureBackend, TextureCache, TextureLoader};

/// Render loop state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LoopState {
    Uninitialized,
    Active,
    Suspended,
    Destroyed,
}

/// Platform surface events that drive [`LoopState`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    /// A GPU context was created or recreated.
    Create,
    /// The context went away (app backgrounded, surface destroyed).
    Lose,
    /// Final teardown.
    Destroy,
}

/// Pure transition table.
///
/// `Create` on an active loop is a recreation (implicit loss). `Lose`
/// without a context is a no-op. Nothing but `Destroy` is accepted after
/// teardown.
pub fn next_state(from: LoopState, event: SurfaceEvent) -> Result<LoopState> {
    use LoopState::*;
    use SurfaceEvent::*;

    match (from, event) {
        (Destroyed, Destroy) => Ok(Destroyed),
        (Destroyed, _) => Err(Error::InvalidTransition { from, event }),
        (_, Destroy) => Ok(Destroyed),
        (_, Create) => Ok(Active),
        (Active, Lose) => Ok(Suspended),
        (state, Lose) => Ok(state),
    }
}

/// Render-thread resources a transition may touch.
pub struct LifecycleCtx<'a> {
    pub link: &'a ControlLink,
    pub cache: &'a mut TextureCache,
    pub loader: &'a TextureLoader,
    /// Backend of the context being torn down, if one is still alive.
    pub backend: Option<&'a mut Box<dyn TextureBackend>>,
    pub rasterizer: &'a mut dyn Rasterizer,
}

/// Owns the create / lose / destroy sequences for the GPU surface.
#[derive(Debug)]
pub struct SurfaceLifecycle {
    state: LoopState,
}

impl Default for SurfaceLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceLifecycle {
    pub fn new() -> Self {
        Self {
            state: LoopState::Uninitialized,
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == LoopState::Active
    }

    /// A context was (re)created.
    ///
    /// Every cached texture gets a silent reload queued ahead of anything the
    /// client submitted meanwhile, so the first frame on the new context
    /// re-uploads them through the normal drain before rendering.
    pub fn create(&mut self, ctx: LifecycleCtx<'_>) -> Result<()> {
        let from = self.state;
        let to = next_state(from, SurfaceEvent::Create)?;

        if from == LoopState::Active {
            log::info!("surface recreated without loss notification; treating as lost");
            ctx.rasterizer.context_lost();
            ctx.cache.invalidate_all();
        }

        let reloads = ctx.cache.reload_all();
        log::info!(
            "surface created ({from:?} -> {to:?}); {} texture(s) queued for reload",
            reloads.len()
        );
        ctx.link.commands.requeue_front(reloads);

        self.state = to;
        Ok(())
    }

    /// The context is gone. Returns whether anything changed.
    ///
    /// Cache entries are kept as metadata so the next `create` can reload
    /// them.
    pub fn lose(&mut self, ctx: LifecycleCtx<'_>) -> Result<bool> {
        let from = self.state;
        let to = next_state(from, SurfaceEvent::Lose)?;
        if from != LoopState::Active {
            log::debug!("context loss while {from:?}; nothing to do");
            return Ok(false);
        }

        log::info!("context lost; {} texture(s) kept for reload", ctx.cache.len());
        ctx.rasterizer.context_lost();
        ctx.cache.invalidate_all();

        self.state = to;
        Ok(true)
    }

    /// Final teardown. Idempotent.
    ///
    /// Pending operations and frame requests are cancelled, never dropped
    /// silently; texture handles are released while the backend still
    /// exists.
    pub fn destroy(&mut self, ctx: LifecycleCtx<'_>) -> Result<()> {
        let from = self.state;
        self.state = next_state(from, SurfaceEvent::Destroy)?;
        if from == LoopState::Destroyed {
            return Ok(());
        }

        let pending = ctx.link.commands.close();
        let cancelled_ops = pending.len();
        pending.into_iter().for_each(|op| op.cancel());
        let cancelled_frames = ctx.link.frames.cancel_all();

        match ctx.backend {
            Some(backend) => {
                let mut gpu = GpuResources {
                    loader: ctx.loader,
                    backend: &mut **backend,
                    rasterizer: &mut *ctx.rasterizer,
                };
                ctx.cache.release_all(&mut gpu);
            }
            None => ctx.cache.forget_all(),
        }

        if from == LoopState::Active {
            ctx.rasterizer.context_lost();
        }
        ctx.rasterizer.release();

        log::info!(
            "surface destroyed ({from:?}); cancelled {cancelled_ops} operation(s) and {cancelled_frames} frame request(s)"
        );
        Ok(())
    }
}
