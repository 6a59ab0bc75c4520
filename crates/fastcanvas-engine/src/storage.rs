//! Asset and storage access.
//!
//! Texture sources are read through [`Storage::open_asset`]; capture
//! destinations are resolved and prepared through the same collaborator.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Asset/storage collaborator consumed by the texture loader and capture.
pub trait Storage: Send + Sync {
    /// Opens an asset by its client-facing path.
    fn open_asset(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Maps a client-facing capture destination to a writable path.
    ///
    /// `None` when the destination would leave the storage root.
    fn storage_path(&self, destination: &str) -> Option<PathBuf>;

    /// Creates `dir` (and parents) if missing. Returns whether it exists now.
    fn ensure_directory(&self, dir: &Path) -> bool;
}

/// Roots for [`FsStorage`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory asset paths are relative to.
    pub asset_root: PathBuf,

    /// Directory capture destinations are relative to.
    pub storage_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("www"),
            storage_root: PathBuf::from("."),
        }
    }
}

/// Filesystem-backed storage.
#[derive(Debug, Clone, Default)]
pub struct FsStorage {
    config: StorageConfig,
}

impl FsStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl Storage for FsStorage {
    fn open_asset(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let relative = relative_path(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("asset path escapes the asset root: {path}"),
            )
        })?;
        let file = File::open(self.config.asset_root.join(relative))?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn storage_path(&self, destination: &str) -> Option<PathBuf> {
        // A leading separator still lands under the root: "/captures/a.png".
        relative_path(destination).map(|relative| self.config.storage_root.join(relative))
    }

    fn ensure_directory(&self, dir: &Path) -> bool {
        if dir.is_dir() {
            return true;
        }
        match std::fs::create_dir_all(dir) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("could not create directory {}: {err}", dir.display());
                false
            }
        }
    }
}

/// Normalises a client path, refusing anything that climbs out of its root.
pub(crate) fn relative_path(path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}
