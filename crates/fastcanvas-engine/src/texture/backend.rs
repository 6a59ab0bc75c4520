use crate::error::TextureLoadError;

/// Opaque GPU texture handle, valid only for the backend that issued it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpuHandle(pub u64);

/// Allocation request for an RGBA8 texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub filter: wgpu::FilterMode,
}

/// GPU texture storage for the texture cache.
///
/// Implementations are owned by the render thread and bound to one GPU
/// context; every call is a GPU call. When the context is lost the backend
/// is dropped without releasing anything, since its handles died with it.
pub trait TextureBackend: Send {
    /// Allocates zero-initialised storage.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuHandle, TextureLoadError>;

    /// Uploads tightly packed RGBA8 rows into a sub-region of `handle`.
    fn write_region(
        &mut self,
        handle: GpuHandle,
        origin: (u32, u32),
        size: (u32, u32),
        rgba: &[u8],
    ) -> Result<(), TextureLoadError>;

    /// Frees the storage behind `handle`. Unknown handles are ignored.
    fn release(&mut self, handle: GpuHandle);
}
