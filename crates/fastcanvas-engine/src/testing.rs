//! Test doubles shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::color::Rgb;
use crate::error::{Error, Result, TextureLoadError};
use crate::raster::{CaptureRequest, GpuStatus, Rasterizer};
use crate::storage::Storage;
use crate::texture::{GpuHandle, TextureBackend, TextureDesc, TextureId, TextureInfo};

/// Encodes a `width × height` opaque PNG in memory.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding");
    out.into_inner()
}

// ── storage ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage {
    assets: HashMap<String, Vec<u8>>,
    pub refuse_directories: bool,
    pub created_dirs: Mutex<Vec<PathBuf>>,
}

impl MemoryStorage {
    pub fn insert(&mut self, path: &str, bytes: Vec<u8>) {
        self.assets.insert(path.to_string(), bytes);
    }
}

impl Storage for MemoryStorage {
    fn open_asset(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        match self.assets.get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(io::Error::new(io::ErrorKind::NotFound, path.to_string())),
        }
    }

    fn storage_path(&self, destination: &str) -> Option<PathBuf> {
        crate::storage::relative_path(destination).map(|relative| Path::new("/storage").join(relative))
    }

    fn ensure_directory(&self, dir: &Path) -> bool {
        if self.refuse_directories {
            return false;
        }
        self.created_dirs.lock().push(dir.to_path_buf());
        true
    }
}

// ── texture backend ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next: u64,
    pub created: Vec<TextureDesc>,
    pub writes: Vec<(GpuHandle, (u32, u32), (u32, u32), usize)>,
    pub released: Vec<GpuHandle>,
    pub live: HashSet<GpuHandle>,
    pub fail_create: bool,
    pub fail_write: bool,
}

impl TextureBackend for RecordingBackend {
    fn create_texture(&mut self, desc: &TextureDesc) -> std::result::Result<GpuHandle, TextureLoadError> {
        if self.fail_create {
            return Err(TextureLoadError::GpuAllocation("out of memory".into()));
        }
        self.next += 1;
        let handle = GpuHandle(self.next);
        self.created.push(*desc);
        self.live.insert(handle);
        Ok(handle)
    }

    fn write_region(
        &mut self,
        handle: GpuHandle,
        origin: (u32, u32),
        size: (u32, u32),
        rgba: &[u8],
    ) -> std::result::Result<(), TextureLoadError> {
        if self.fail_write {
            return Err(TextureLoadError::GpuAllocation("upload rejected".into()));
        }
        self.writes.push((handle, origin, size, rgba.len()));
        Ok(())
    }

    fn release(&mut self, handle: GpuHandle) {
        self.released.push(handle);
        self.live.remove(&handle);
    }
}

/// Backend whose records outlive the render loop that owns it.
#[derive(Debug, Default, Clone)]
pub struct SharedBackend(pub Arc<Mutex<RecordingBackend>>);

impl TextureBackend for SharedBackend {
    fn create_texture(&mut self, desc: &TextureDesc) -> std::result::Result<GpuHandle, TextureLoadError> {
        self.0.lock().create_texture(desc)
    }

    fn write_region(
        &mut self,
        handle: GpuHandle,
        origin: (u32, u32),
        size: (u32, u32),
        rgba: &[u8],
    ) -> std::result::Result<(), TextureLoadError> {
        self.0.lock().write_region(handle, origin, size, rgba)
    }

    fn release(&mut self, handle: GpuHandle) {
        self.0.lock().release(handle)
    }
}

// ── rasterizer ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RasterCall {
    Render(String),
    Background(Rgb),
    Ortho(u32, u32),
    AddTexture(TextureId, TextureInfo),
    RemoveTexture(TextureId),
    ContextLost,
    SurfaceChanged(u32, u32),
    Capture(u64, CaptureRequest),
    Release,
}

#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    pub calls: Vec<RasterCall>,
    pub status: Option<GpuStatus>,
    pub fail_capture: bool,
}

impl RecordingRasterizer {
    pub fn renders(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RasterCall::Render(p) => Some(p.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Rasterizer for RecordingRasterizer {
    fn render(&mut self, payload: &str) {
        self.calls.push(RasterCall::Render(payload.to_string()));
    }

    fn set_background_color(&mut self, color: Rgb) {
        self.calls.push(RasterCall::Background(color));
    }

    fn set_ortho(&mut self, width: u32, height: u32) {
        self.calls.push(RasterCall::Ortho(width, height));
    }

    fn add_texture(&mut self, id: TextureId, info: &TextureInfo) {
        self.calls.push(RasterCall::AddTexture(id, *info));
    }

    fn remove_texture(&mut self, id: TextureId) {
        self.calls.push(RasterCall::RemoveTexture(id));
    }

    fn context_lost(&mut self) {
        self.calls.push(RasterCall::ContextLost);
    }

    fn surface_changed(&mut self, width: u32, height: u32) {
        self.calls.push(RasterCall::SurfaceChanged(width, height));
    }

    fn capture_region(&mut self, request_id: u64, request: &CaptureRequest) -> Result<()> {
        self.calls.push(RasterCall::Capture(request_id, request.clone()));
        if self.fail_capture {
            return Err(Error::Io("read-only file system".into()));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.calls.push(RasterCall::Release);
    }

    fn check_error(&mut self) -> GpuStatus {
        self.status.take().unwrap_or(GpuStatus::Ok)
    }
}
