//! GPU surface lifecycle.
//!
//! `Uninitialized → Active ⇄ Suspended → Destroyed`, driven by platform
//! surface events. The effects of each transition (reload scheduling,
//! teardown cancellation) live here; the render loop only forwards events.

mod surface;

pub use surface::{next_state, LifecycleCtx, LoopState, SurfaceEvent, SurfaceLifecycle};
