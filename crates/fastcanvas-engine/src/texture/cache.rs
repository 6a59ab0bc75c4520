use std::collections::BTreeMap;

use crate::channel::PendingOperation;
use crate::error::Error;
use crate::raster::Rasterizer;
use crate::sync::Completion;

use super::{Texture, TextureBackend, TextureId, TextureLoader, TextureSize, TextureSpec};

/// Everything a cache mutation may touch on the GPU side.
///
/// Only constructible on the render thread, where the backend lives.
pub struct GpuResources<'a> {
    pub loader: &'a TextureLoader,
    pub backend: &'a mut dyn TextureBackend,
    pub rasterizer: &'a mut dyn Rasterizer,
}

/// Authoritative id → texture map; sole owner of GPU texture handles.
///
/// Owned by the render thread. The control thread never sees it; it only
/// submits operations that end up here.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: BTreeMap<TextureId, Texture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `spec`, replacing any texture already registered under its id.
    ///
    /// `completion: None` is a silent reload: it reports nothing, and is
    /// dropped if the id was unloaded after the reload was scheduled.
    pub fn load(
        &mut self,
        spec: TextureSpec,
        completion: Option<Completion<TextureSize>>,
        gpu: &mut GpuResources<'_>,
    ) {
        let id = spec.id;
        if completion.is_none() && !self.entries.contains_key(&id) {
            log::debug!("skipping reload of {spec}: unloaded in the meantime");
            return;
        }

        log::info!("load texture: {spec}");
        self.evict(id, gpu);

        match gpu.loader.load(&spec.source, &mut *gpu.backend) {
            Ok(info) => {
                gpu.rasterizer.add_texture(id, &info);
                log::info!(
                    "loaded texture: {spec} ({}x{}, storage {}x{})",
                    info.width,
                    info.height,
                    info.storage_width,
                    info.storage_height
                );
                self.entries.insert(id, Texture::loaded(spec, info));
                if let Some(completion) = completion {
                    completion.succeed(info.size());
                }
            }
            Err(err) => {
                log::warn!("load texture error: {spec}: {err}");
                if let Some(completion) = completion {
                    completion.fail(Error::TextureLoad(err));
                }
            }
        }
    }

    /// Releases and forgets `id`. Unknown ids are ignored.
    pub fn unload(&mut self, id: TextureId, gpu: &mut GpuResources<'_>) {
        if self.evict(id, gpu) {
            log::info!("unload texture: {id}");
        } else {
            log::debug!("unload texture: {id} not present");
        }
    }

    /// Schedules a silent reload of every registered texture.
    ///
    /// Handles are forgotten without GPU calls; the entries stay so clients
    /// need not reissue their loads. Entries with a reload already scheduled
    /// are skipped, so each texture is uploaded once per recreation.
    pub fn reload_all(&mut self) -> Vec<PendingOperation> {
        self.entries
            .values_mut()
            .filter(|texture| !texture.reload_pending)
            .map(|texture| {
                texture.gpu = None;
                texture.reload_pending = true;
                log::info!("queue reload texture: {}", texture.spec);
                PendingOperation::reload(texture.spec.clone())
            })
            .collect()
    }

    /// Forgets every GPU handle after context loss; entries survive.
    pub fn invalidate_all(&mut self) {
        for texture in self.entries.values_mut() {
            texture.gpu = None;
        }
    }

    /// Empties the cache without GPU calls; for teardown with no context.
    pub fn forget_all(&mut self) {
        self.entries.clear();
    }

    /// Releases every live handle and empties the cache.
    pub fn release_all(&mut self, gpu: &mut GpuResources<'_>) {
        let ids: Vec<TextureId> = self.entries.keys().copied().collect();
        for id in ids {
            self.evict(id, gpu);
        }
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes `id`, releasing its GPU handle if it has one.
    fn evict(&mut self, id: TextureId, gpu: &mut GpuResources<'_>) -> bool {
        let Some(old) = self.entries.remove(&id) else {
            return false;
        };
        if let Some(info) = old.gpu {
            gpu.rasterizer.remove_texture(id);
            gpu.loader.unload(info.handle, &mut *gpu.backend);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TextureLoadError;
    use crate::testing::{png_bytes, MemoryStorage, RasterCall, RecordingBackend, RecordingRasterizer};
    use crate::texture::GpuHandle;
    use std::sync::Arc;

    struct Fixture {
        loader: TextureLoader,
        backend: RecordingBackend,
        raster: RecordingRasterizer,
        cache: TextureCache,
    }

    impl Fixture {
        fn new() -> Self {
            let mut storage = MemoryStorage::default();
            storage.insert("a.png", png_bytes(100, 60));
            storage.insert("b.png", png_bytes(16, 16));
            Self {
                loader: TextureLoader::new(Arc::new(storage)),
                backend: RecordingBackend::default(),
                raster: RecordingRasterizer::default(),
                cache: TextureCache::new(),
            }
        }

        fn gpu(&mut self) -> (&mut TextureCache, GpuResources<'_>) {
            (
                &mut self.cache,
                GpuResources {
                    loader: &self.loader,
                    backend: &mut self.backend,
                    rasterizer: &mut self.raster,
                },
            )
        }

        fn load(&mut self, id: i32, source: &str) -> crate::error::Result<TextureSize> {
            let (c, rx) = Completion::channel();
            let (cache, mut gpu) = self.gpu();
            cache.load(TextureSpec::new(TextureId(id), source), Some(c), &mut gpu);
            rx.recv().unwrap()
        }

        fn unload(&mut self, id: i32) {
            let (cache, mut gpu) = self.gpu();
            cache.unload(TextureId(id), &mut gpu);
        }

        fn apply(&mut self, ops: Vec<PendingOperation>) {
            for op in ops {
                let (cache, mut gpu) = self.gpu();
                match op {
                    PendingOperation::Load { texture, completion } => cache.load(texture, completion, &mut gpu),
                    PendingOperation::Unload { id } => cache.unload(id, &mut gpu),
                    other => panic!("unexpected op {other:?}"),
                }
            }
        }
    }

    // ── load ──────────────────────────────────────────────────────────────

    #[test]
    fn load_reports_true_size_and_registers_entry() {
        let mut f = Fixture::new();
        assert_eq!(f.load(7, "a.png"), Ok(TextureSize { width: 100, height: 60 }));

        let tex = f.cache.get(TextureId(7)).unwrap();
        assert!(tex.is_loaded());
        let info = tex.gpu.unwrap();
        assert_eq!((info.storage_width, info.storage_height), (128, 64));
        assert_eq!(f.raster.calls, vec![RasterCall::AddTexture(TextureId(7), info)]);
    }

    #[test]
    fn load_over_existing_id_replaces_and_releases_first_handle() {
        let mut f = Fixture::new();
        f.load(3, "a.png").unwrap();
        let first = f.cache.get(TextureId(3)).unwrap().handle().unwrap();

        f.load(3, "b.png").unwrap();

        assert_eq!(f.cache.len(), 1);
        let second = f.cache.get(TextureId(3)).unwrap();
        assert_eq!(second.source(), "b.png");
        assert_ne!(second.handle(), Some(first));
        assert_eq!(f.backend.released, vec![first]);
        assert_eq!(f.backend.live.len(), 1);
    }

    #[test]
    fn failed_load_leaves_id_absent() {
        let mut f = Fixture::new();
        let err = f.load(5, "missing.png").unwrap_err();
        assert_eq!(
            err,
            Error::TextureLoad(TextureLoadError::ResourceNotFound("missing.png".into()))
        );
        assert!(!f.cache.contains(TextureId(5)));
    }

    #[test]
    fn failed_replacement_still_evicts_the_old_texture() {
        let mut f = Fixture::new();
        f.load(2, "a.png").unwrap();
        assert!(f.load(2, "missing.png").is_err());

        assert!(!f.cache.contains(TextureId(2)));
        assert!(f.backend.live.is_empty());
    }

    // ── unload ────────────────────────────────────────────────────────────

    #[test]
    fn unload_unknown_id_is_a_silent_no_op() {
        let mut f = Fixture::new();
        f.load(1, "b.png").unwrap();
        let before_calls = f.raster.calls.len();

        f.unload(99);

        assert_eq!(f.cache.len(), 1);
        assert_eq!(f.raster.calls.len(), before_calls);
        assert!(f.backend.released.is_empty());
    }

    #[test]
    fn unload_releases_handle_and_tells_rasterizer() {
        let mut f = Fixture::new();
        f.load(1, "b.png").unwrap();
        let handle = f.cache.get(TextureId(1)).unwrap().handle().unwrap();

        f.unload(1);

        assert!(f.cache.is_empty());
        assert_eq!(f.backend.released, vec![handle]);
        assert_eq!(f.raster.calls.last(), Some(&RasterCall::RemoveTexture(TextureId(1))));
    }

    // ── ordering ──────────────────────────────────────────────────────────

    fn same_id_script() -> Vec<PendingOperation> {
        let load = |id: i32, src: &str| {
            PendingOperation::load(TextureSpec::new(TextureId(id), src), Completion::ignore())
        };
        vec![
            load(3, "a.png"),
            PendingOperation::Unload { id: TextureId(3) },
            load(3, "b.png"),
            load(4, "a.png"),
            PendingOperation::Unload { id: TextureId(4) },
        ]
    }

    #[test]
    fn batch_equals_one_at_a_time_application() {
        let mut sequential = Fixture::new();
        for op in same_id_script() {
            sequential.apply(vec![op]);
        }

        let mut batched = Fixture::new();
        batched.apply(same_id_script());

        let summary = |c: &TextureCache| {
            c.iter()
                .map(|t| (t.id(), t.source().to_string(), t.is_loaded()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&batched.cache), summary(&sequential.cache));
        assert_eq!(summary(&batched.cache), vec![(TextureId(3), "b.png".to_string(), true)]);
    }

    // ── reload ────────────────────────────────────────────────────────────

    #[test]
    fn reload_all_keeps_metadata_and_drops_handles() {
        let mut f = Fixture::new();
        f.load(2, "b.png").unwrap();
        f.load(1, "a.png").unwrap();

        let ops = f.cache.reload_all();

        let specs: Vec<_> = ops
            .iter()
            .map(|op| match op {
                PendingOperation::Load { texture, completion } => {
                    assert!(completion.is_none());
                    texture.clone()
                }
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(
            specs,
            vec![
                TextureSpec::new(TextureId(1), "a.png"),
                TextureSpec::new(TextureId(2), "b.png"),
            ]
        );
        assert_eq!(f.cache.len(), 2);
        assert!(f.cache.iter().all(|t| !t.is_loaded()));
    }

    #[test]
    fn second_reload_all_before_apply_schedules_nothing() {
        let mut f = Fixture::new();
        f.load(1, "a.png").unwrap();

        assert_eq!(f.cache.reload_all().len(), 1);
        assert!(f.cache.reload_all().is_empty());
    }

    #[test]
    fn applied_reload_restores_handle_and_clears_pending_flag() {
        let mut f = Fixture::new();
        f.load(1, "a.png").unwrap();
        let ops = f.cache.reload_all();
        f.apply(ops);

        let tex = f.cache.get(TextureId(1)).unwrap();
        assert!(tex.is_loaded());
        assert!(!tex.reload_pending);
        assert_eq!(f.cache.reload_all().len(), 1);
    }

    #[test]
    fn reload_of_unloaded_id_is_discarded() {
        let mut f = Fixture::new();
        f.load(1, "a.png").unwrap();
        let ops = f.cache.reload_all();
        f.unload(1);
        let created = f.backend.created.len();

        f.apply(ops);

        assert!(!f.cache.contains(TextureId(1)));
        assert_eq!(f.backend.created.len(), created);
    }

    #[test]
    fn unload_of_metadata_only_entry_makes_no_gpu_call() {
        let mut f = Fixture::new();
        f.load(1, "a.png").unwrap();
        f.cache.invalidate_all();
        let calls = f.raster.calls.len();

        f.unload(1);

        assert!(f.cache.is_empty());
        assert!(f.backend.released.is_empty());
        assert_eq!(f.raster.calls.len(), calls);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn release_all_frees_every_live_handle() {
        let mut f = Fixture::new();
        f.load(1, "a.png").unwrap();
        f.load(2, "b.png").unwrap();

        let (cache, mut gpu) = f.gpu();
        cache.release_all(&mut gpu);

        assert!(f.cache.is_empty());
        assert!(f.backend.live.is_empty());
        let mut released = f.backend.released.clone();
        released.sort();
        assert_eq!(released, vec![GpuHandle(1), GpuHandle(2)]);
    }
}
