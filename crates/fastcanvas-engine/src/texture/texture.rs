use std::fmt;

use super::GpuHandle;

/// Client-assigned texture identifier; unique key of the texture cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub i32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a client asked to load: an id and the asset it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSpec {
    pub id: TextureId,
    pub source: String,
}

impl TextureSpec {
    pub fn new(id: TextureId, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
        }
    }
}

impl fmt::Display for TextureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source, self.id)
    }
}

/// True (unpadded) image dimensions reported back to the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

/// GPU-side description of a loaded texture, as handed to the rasterizer.
///
/// Storage may be padded to powers of two; only the top-left
/// `width × height` texels hold image data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub handle: GpuHandle,
    pub width: u32,
    pub height: u32,
    pub storage_width: u32,
    pub storage_height: u32,
}

impl TextureInfo {
    #[inline]
    pub fn size(&self) -> TextureSize {
        TextureSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Fraction of the storage covered by image data, for UV scaling.
    #[inline]
    pub fn uv_scale(&self) -> (f32, f32) {
        (
            self.width as f32 / self.storage_width.max(1) as f32,
            self.height as f32 / self.storage_height.max(1) as f32,
        )
    }

    #[inline]
    pub fn is_padded(&self) -> bool {
        self.width != self.storage_width || self.height != self.storage_height
    }
}

/// One cache entry.
///
/// `gpu` is `Some` only between a successful upload and the next unload or
/// context loss; the entry itself (id → source) outlives context loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub spec: TextureSpec,
    pub gpu: Option<TextureInfo>,
    pub(crate) reload_pending: bool,
}

impl Texture {
    pub(crate) fn loaded(spec: TextureSpec, info: TextureInfo) -> Self {
        Self {
            spec,
            gpu: Some(info),
            reload_pending: false,
        }
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.spec.id
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.spec.source
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.gpu.is_some()
    }

    #[inline]
    pub fn handle(&self) -> Option<GpuHandle> {
        self.gpu.map(|info| info.handle)
    }
}
