use crate::lifecycle::{LoopState, SurfaceEvent};

/// Result alias used across the engine core.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a texture could not be brought onto the GPU.
///
/// Every variant carries a human-readable cause. Loads are never retried, so
/// the cause is the only diagnostic the client gets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureLoadError {
    #[error("texture asset not found: {0}")]
    ResourceNotFound(String),

    #[error("failed to decode texture: {0}")]
    Decode(String),

    #[error("GPU texture allocation failed: {0}")]
    GpuAllocation(String),
}

/// Errors reported to control-layer completions and lifecycle callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    TextureLoad(#[from] TextureLoadError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("cancelled at teardown")]
    CancelledAtTeardown,

    #[error("invalid lifecycle transition: {event:?} while {from:?}")]
    InvalidTransition { from: LoopState, event: SurfaceEvent },

    /// The GPU context vanished while the loop believed it was active.
    ///
    /// This always indicates a lifecycle-tracking bug and is not recoverable.
    #[error("GPU context exhausted outside a lifecycle transition")]
    ContextExhausted,
}

impl Error {
    /// True for errors that must stop the render thread.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ContextExhausted)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
