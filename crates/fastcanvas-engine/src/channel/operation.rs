use std::path::PathBuf;

use crate::color::Rgb;
use crate::raster::CaptureRequest;
use crate::sync::Completion;
use crate::texture::{TextureId, TextureSize, TextureSpec};

/// A request on its way from the control thread to the render thread.
///
/// Consumed exactly once: either applied by the render loop or cancelled at
/// teardown. Never retried.
#[derive(Debug)]
pub enum PendingOperation {
    /// Load (or replace) a texture. `completion: None` marks a silent reload.
    Load {
        texture: TextureSpec,
        completion: Option<Completion<TextureSize>>,
    },
    Unload {
        id: TextureId,
    },
    SetBackgroundColor(Rgb),
    SetOrtho {
        width: u32,
        height: u32,
    },
    Capture {
        request_id: u64,
        request: CaptureRequest,
        completion: Completion<PathBuf>,
    },
}

impl PendingOperation {
    pub fn load(texture: TextureSpec, completion: Completion<TextureSize>) -> Self {
        Self::Load {
            texture,
            completion: Some(completion),
        }
    }

    pub fn reload(texture: TextureSpec) -> Self {
        Self::Load {
            texture,
            completion: None,
        }
    }

    /// Texture this operation touches, if any.
    pub fn texture_id(&self) -> Option<TextureId> {
        match self {
            Self::Load { texture, .. } => Some(texture.id),
            Self::Unload { id } => Some(*id),
            _ => None,
        }
    }

    /// Resolves any completion with a teardown cancellation.
    pub fn cancel(self) {
        match self {
            Self::Load {
                completion: Some(completion),
                ..
            } => completion.cancel(),
            Self::Capture { completion, .. } => completion.cancel(),
            _ => {}
        }
    }
}
