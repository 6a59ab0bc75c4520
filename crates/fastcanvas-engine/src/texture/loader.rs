use std::io::{self, Read};
use std::sync::Arc;

use crate::error::TextureLoadError;
use crate::storage::Storage;

use super::{GpuHandle, TextureBackend, TextureDesc, TextureInfo};

/// Decodes image assets and uploads them to GPU memory.
///
/// Storage is padded to the next power of two in each dimension; the image
/// occupies the top-left region and the reported size is the image's own.
/// Filtering is always linear.
#[derive(Clone)]
pub struct TextureLoader {
    storage: Arc<dyn Storage>,
}

impl TextureLoader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Loads `source` into a new GPU texture.
    ///
    /// On error nothing stays allocated on the backend.
    pub fn load(
        &self,
        source: &str,
        backend: &mut dyn TextureBackend,
    ) -> Result<TextureInfo, TextureLoadError> {
        let bytes = self.read_asset(source)?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| TextureLoadError::Decode(format!("{source}: {e}")))?
            .into_rgba8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureLoadError::Decode(format!("{source}: image is empty")));
        }

        let (storage_width, storage_height) = padded_size(width, height);
        if (storage_width, storage_height) != (width, height) {
            log::info!(
                "padding texture {source} from {width}x{height} to {storage_width}x{storage_height}"
            );
        }

        let handle = backend.create_texture(&TextureDesc {
            width: storage_width,
            height: storage_height,
            filter: wgpu::FilterMode::Linear,
        })?;

        if let Err(err) = backend.write_region(handle, (0, 0), (width, height), image.as_raw()) {
            backend.release(handle);
            return Err(err);
        }

        Ok(TextureInfo {
            handle,
            width,
            height,
            storage_width,
            storage_height,
        })
    }

    /// Releases a texture previously returned by [`load`](Self::load).
    pub fn unload(&self, handle: GpuHandle, backend: &mut dyn TextureBackend) {
        backend.release(handle);
    }

    fn read_asset(&self, source: &str) -> Result<Vec<u8>, TextureLoadError> {
        let mut reader = self.storage.open_asset(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TextureLoadError::ResourceNotFound(source.to_string()),
            _ => TextureLoadError::ResourceNotFound(format!("{source}: {e}")),
        })?;

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| TextureLoadError::ResourceNotFound(format!("{source}: {e}")))?;
        Ok(bytes)
    }
}

/// Smallest power-of-two storage that holds `width × height`.
#[inline]
pub fn padded_size(width: u32, height: u32) -> (u32, u32) {
    (width.next_power_of_two(), height.next_power_of_two())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png_bytes, MemoryStorage, RecordingBackend};

    fn loader_with(assets: &[(&str, Vec<u8>)]) -> TextureLoader {
        let mut storage = MemoryStorage::default();
        for (path, bytes) in assets {
            storage.insert(path, bytes.clone());
        }
        TextureLoader::new(Arc::new(storage))
    }

    // ── padding ───────────────────────────────────────────────────────────

    #[test]
    fn padded_size_rounds_each_dimension_up() {
        assert_eq!(padded_size(100, 60), (128, 64));
        assert_eq!(padded_size(256, 3), (256, 4));
        assert_eq!(padded_size(1, 1), (1, 1));
        assert_eq!(padded_size(1, 3), (1, 4));
    }

    #[test]
    fn npot_image_reports_true_size_and_pads_storage() {
        let loader = loader_with(&[("img/hero.png", png_bytes(100, 60))]);
        let mut backend = RecordingBackend::default();

        let info = loader.load("img/hero.png", &mut backend).unwrap();

        assert_eq!((info.width, info.height), (100, 60));
        assert_eq!((info.storage_width, info.storage_height), (128, 64));
        let desc = backend.created[0];
        assert_eq!((desc.width, desc.height), (128, 64));
        assert_eq!(desc.filter, wgpu::FilterMode::Linear);
        assert_eq!(backend.writes, vec![(info.handle, (0, 0), (100, 60), 100 * 60 * 4)]);
    }

    #[test]
    fn pot_image_is_uploaded_unpadded() {
        let loader = loader_with(&[("a.png", png_bytes(64, 32))]);
        let mut backend = RecordingBackend::default();

        let info = loader.load("a.png", &mut backend).unwrap();
        assert!(!info.is_padded());
        assert_eq!((backend.created[0].width, backend.created[0].height), (64, 32));
    }

    // ── failures ──────────────────────────────────────────────────────────

    #[test]
    fn missing_asset_is_resource_not_found() {
        let loader = loader_with(&[]);
        let mut backend = RecordingBackend::default();

        let err = loader.load("nope.png", &mut backend).unwrap_err();
        assert_eq!(err, TextureLoadError::ResourceNotFound("nope.png".into()));
        assert!(backend.created.is_empty());
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let loader = loader_with(&[("bad.png", b"not an image".to_vec())]);
        let mut backend = RecordingBackend::default();

        let err = loader.load("bad.png", &mut backend).unwrap_err();
        assert!(matches!(err, TextureLoadError::Decode(_)));
        assert!(backend.created.is_empty());
    }

    #[test]
    fn allocation_failure_leaves_nothing_allocated() {
        let loader = loader_with(&[("a.png", png_bytes(4, 4))]);
        let mut backend = RecordingBackend::default();
        backend.fail_create = true;

        let err = loader.load("a.png", &mut backend).unwrap_err();
        assert!(matches!(err, TextureLoadError::GpuAllocation(_)));
        assert!(backend.live.is_empty());
    }

    #[test]
    fn upload_failure_releases_the_allocation() {
        let loader = loader_with(&[("a.png", png_bytes(4, 4))]);
        let mut backend = RecordingBackend::default();
        backend.fail_write = true;

        assert!(loader.load("a.png", &mut backend).is_err());
        assert_eq!(backend.created.len(), 1);
        assert_eq!(backend.released.len(), 1);
        assert!(backend.live.is_empty());
    }
}
