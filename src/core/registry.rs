// src/core/registry.rs
use crate::config::global::GlobalConfig;
use crate::core::dir_cache::DirectoryEntryCache;
use crate::core::discovery::{build_pool, DiscoveryEngine, DiscoveryStream};
use crate::core::load_status;
use crate::core::manifest::ManifestParser;
use crate::core::metadata_cache::MetadataCache;
use crate::core::mod_reader::ModReader;
use crate::core::source_collector::SourceCollector;
use crate::models::descriptor::ModDescriptor;
use crate::models::error::ModError;
use crate::models::source::SourceListing;
use crate::utils::thread::worker_count;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Long-lived owner of the discovery caches and the active configuration.
pub struct ModRegistry {
    pub config: Arc<Mutex<GlobalConfig>>,
    metadata_cache: Arc<MetadataCache>,
    dir_cache: Arc<DirectoryEntryCache>,
    fallback_icon: Option<Arc<[u8]>>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ModRegistry {
    pub fn new(config: GlobalConfig) -> Self {
        let metadata_cache = Arc::new(MetadataCache::new(config.cache_root()));
        Self {
            config: Arc::new(Mutex::new(config)),
            metadata_cache,
            dir_cache: Arc::new(DirectoryEntryCache::new()),
            fallback_icon: None,
            pool: build_pool(worker_count()),
        }
    }

    pub fn with_fallback_icon(mut self, icon: impl Into<Arc<[u8]>>) -> Self {
        self.fallback_icon = Some(icon.into());
        self
    }

    pub fn metadata_cache(&self) -> &Arc<MetadataCache> {
        &self.metadata_cache
    }

    pub fn dir_cache(&self) -> &Arc<DirectoryEntryCache> {
        &self.dir_cache
    }

    fn engine(&self, config: &GlobalConfig) -> DiscoveryEngine<ModReader> {
        let parser = ManifestParser::new(config.target_game_version.clone());
        let mut reader = ModReader::new(
            parser,
            Arc::clone(&self.metadata_cache),
            Arc::clone(&self.dir_cache),
        );
        if let Some(icon) = &self.fallback_icon {
            reader = reader.with_fallback_icon(Arc::clone(icon));
        }
        let engine = DiscoveryEngine::new(Arc::new(reader));
        match &self.pool {
            Some(pool) => engine.with_pool(Arc::clone(pool)),
            None => engine,
        }
    }

    pub fn collect_sources(&self) -> SourceListing {
        let config = self.config.lock();
        SourceCollector::new(&*config).collect()
    }

    /// Full scan: collect, process, then judge load status.
    pub fn discover(&self) -> Vec<ModDescriptor> {
        let config = self.config.lock().clone();
        let listing = SourceCollector::new(&config).collect();
        let mut mods = self.engine(&config).discover(&listing);
        load_status::apply(&mut mods, &config);

        let failing = mods.iter().filter(|m| m.load_error.is_some()).count();
        info!(mods = mods.len(), failing, "Discovery complete");
        mods
    }

    /// Streams raw descriptors. Load status needs the full set, so callers
    /// run [`load_status::apply`] once the stream is drained.
    pub fn discover_incremental(&self, cancel: CancellationToken) -> DiscoveryStream {
        let config = self.config.lock().clone();
        let listing = SourceCollector::new(&config).collect();
        self.engine(&config)
            .discover_incremental(listing, config.batch_size, cancel)
    }

    /// Drains an incremental run and applies load status to the result.
    pub async fn discover_streamed(
        &self,
        cancel: CancellationToken,
    ) -> Result<Vec<ModDescriptor>, ModError> {
        let mut mods = self.discover_incremental(cancel).collect_all().await?;
        let config = self.config.lock().clone();
        load_status::apply(&mut mods, &config);
        Ok(mods)
    }

    /// Drops both caches, on disk and in memory.
    pub fn clear_cache(&self) {
        self.dir_cache.clear();
        self.metadata_cache.clear();
        info!("Mod metadata caches cleared");
    }
}
