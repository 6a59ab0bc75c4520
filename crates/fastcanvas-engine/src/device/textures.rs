use std::collections::HashMap;

use crate::error::TextureLoadError;
use crate::texture::{GpuHandle, TextureBackend, TextureDesc};

const BYTES_PER_PIXEL: u32 = 4;

/// A texture allocated by [`WgpuTextureBackend`].
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// RGBA8 texture storage on one wgpu device.
///
/// Requests are checked against the device limits before anything is
/// allocated, so an oversized texture is a load error instead of a wgpu
/// validation failure.
pub struct WgpuTextureBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: HashMap<GpuHandle, GpuTexture>,
    next_handle: u64,
}

impl WgpuTextureBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            textures: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn get(&self, handle: GpuHandle) -> Option<&GpuTexture> {
        self.textures.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl TextureBackend for WgpuTextureBackend {
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<GpuHandle, TextureLoadError> {
        let max = self.device.limits().max_texture_dimension_2d;
        check_extent(desc.width, desc.height, max)?;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fastcanvas texture"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("fastcanvas texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: desc.filter,
            min_filter: desc.filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let handle = GpuHandle(self.next_handle);
        self.next_handle += 1;
        self.textures.insert(
            handle,
            GpuTexture {
                texture,
                view,
                sampler,
            },
        );
        Ok(handle)
    }

    fn write_region(
        &mut self,
        handle: GpuHandle,
        origin: (u32, u32),
        size: (u32, u32),
        rgba: &[u8],
    ) -> Result<(), TextureLoadError> {
        let entry = self.textures.get(&handle).ok_or_else(|| {
            TextureLoadError::GpuAllocation(format!("unknown texture handle {}", handle.0))
        })?;

        let (x, y) = origin;
        let (w, h) = size;
        let extent = entry.texture.size();
        check_region(origin, size, (extent.width, extent.height), rgba.len())?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w * BYTES_PER_PIXEL),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn release(&mut self, handle: GpuHandle) {
        if let Some(entry) = self.textures.remove(&handle) {
            entry.texture.destroy();
        }
    }
}

fn check_extent(width: u32, height: u32, max: u32) -> Result<(), TextureLoadError> {
    if width == 0 || height == 0 || width > max || height > max {
        return Err(TextureLoadError::GpuAllocation(format!(
            "texture {width}x{height} outside device limit {max}"
        )));
    }
    Ok(())
}

fn check_region(
    (x, y): (u32, u32),
    (w, h): (u32, u32),
    (tex_w, tex_h): (u32, u32),
    len: usize,
) -> Result<(), TextureLoadError> {
    let fits = x.checked_add(w).is_some_and(|r| r <= tex_w) && y.checked_add(h).is_some_and(|b| b <= tex_h);
    if !fits {
        return Err(TextureLoadError::GpuAllocation(format!(
            "region {w}x{h}+{x}+{y} outside {tex_w}x{tex_h} texture"
        )));
    }
    let expected = w as usize * h as usize * BYTES_PER_PIXEL as usize;
    if len != expected {
        return Err(TextureLoadError::GpuAllocation(format!(
            "expected {expected} bytes of RGBA8 for {w}x{h}, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_checked_against_limit() {
        assert!(check_extent(2048, 2048, 2048).is_ok());
        assert!(check_extent(4096, 16, 2048).is_err());
        assert!(check_extent(0, 16, 2048).is_err());
    }

    #[test]
    fn region_must_fit_and_match_length() {
        assert!(check_region((0, 0), (100, 60), (128, 64), 100 * 60 * 4).is_ok());
        assert!(check_region((64, 0), (100, 60), (128, 64), 100 * 60 * 4).is_err());
        assert!(check_region((0, 0), (100, 60), (128, 64), 10).is_err());
        assert!(check_region((u32::MAX, 0), (2, 1), (128, 64), 8).is_err());
    }
}
