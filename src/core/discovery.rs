//! Parallel processing of collected sources into descriptors.
//!
//! Both modes fan sources out to a bounded worker pool and hand results back
//! in discovery order, which the duplicate-id pass depends on for its
//! tie-break. Batch mode runs on a rayon pool and returns everything at once.
//! Incremental mode runs workers on tokio's blocking pool, funnels
//! `(order, descriptor)` pairs through a bounded channel into a reordering
//! task, and streams fixed-size batches as soon as a contiguous run is ready.

use crate::core::mod_reader::SourceProcessor;
use crate::models::descriptor::{is_base_game_id, ModDescriptor};
use crate::models::error::ModError;
use crate::models::source::{ModSource, SourceListing};
use crate::utils::thread::worker_count;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 16;

pub struct DiscoveryEngine<P: SourceProcessor + 'static> {
    processor: Arc<P>,
    workers: usize,
    // Batch-mode pool, built on first use; `None` if it could not be built.
    pool: OnceLock<Option<Arc<rayon::ThreadPool>>>,
}

/// Builds the batch-mode pool. `None` (logged) if the threads cannot be spawned.
pub fn build_pool(workers: usize) -> Option<Arc<rayon::ThreadPool>> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("mod-discovery-{i}"))
        .build()
        .map_err(|e| warn!(error = %e, "Could not build discovery pool, batch mode will run sequentially"))
        .ok()
        .map(Arc::new)
}

impl<P: SourceProcessor + 'static> DiscoveryEngine<P> {
    pub fn new(processor: Arc<P>) -> Self {
        let workers = worker_count();
        Self {
            processor,
            workers,
            pool: OnceLock::new(),
        }
    }

    /// Overrides the worker count; clamped to at least one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        let workers = workers.max(1);
        if workers != self.workers {
            self.workers = workers;
            self.pool = OnceLock::new();
        }
        self
    }

    /// Runs batch mode on an existing pool so repeated scans share threads.
    pub fn with_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.workers = pool.current_num_threads();
        self.pool = OnceLock::from(Some(pool));
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes every source and returns descriptors in discovery order,
    /// without base-game mods.
    pub fn discover(&self, listing: &SourceListing) -> Vec<ModDescriptor> {
        info!(sources = listing.len(), workers = self.workers, "Starting mod discovery");
        let processor = &self.processor;

        // Indexed collect keeps discovery order whatever order workers finish in.
        let processed: Vec<ModDescriptor> = match self.pool.get_or_init(|| build_pool(self.workers)) {
            Some(pool) => pool.install(|| {
                listing
                    .sources()
                    .par_iter()
                    .map(|source| processor.process(source))
                    .collect()
            }),
            None => listing
                .sources()
                .iter()
                .map(|source| processor.process(source))
                .collect(),
        };

        let mods: Vec<ModDescriptor> = processed
            .into_iter()
            .filter(|d| !is_base_game_id(&d.mod_id))
            .collect();

        info!(mods = mods.len(), "Mod discovery finished");
        mods
    }

    /// Streams descriptors in discovery order, `batch_size` at a time.
    ///
    /// Must be called from within a tokio runtime. Cancelling `cancel` (or
    /// dropping the returned stream) stops the workers; the stream then
    /// yields [`ModError::Cancelled`] once and ends.
    pub fn discover_incremental(
        &self,
        listing: SourceListing,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> DiscoveryStream {
        let batch_size = batch_size.max(1);
        let cancel = cancel.child_token();
        let sources: Arc<Vec<ModSource>> = Arc::new(listing.into_sources());
        let total = sources.len();
        let workers = self.workers.min(total.max(1));

        info!(sources = total, workers, batch_size, "Starting incremental mod discovery");

        // Bounded hand-offs: workers block when the reorderer falls behind,
        // and the reorderer waits when the consumer does.
        let (done_tx, done_rx) = mpsc::channel::<(usize, ModDescriptor)>(workers * 2);
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<ModDescriptor>>(2);
        let next = Arc::new(AtomicUsize::new(0));

        for _ in 0..workers {
            let sources = Arc::clone(&sources);
            let processor = Arc::clone(&self.processor);
            let next = Arc::clone(&next);
            let tx = done_tx.clone();
            let cancel = cancel.clone();

            tokio::task::spawn_blocking(move || loop {
                if cancel.is_cancelled() {
                    break;
                }
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(source) = sources.get(index) else {
                    break;
                };
                let descriptor = processor.process(source);
                if tx.blocking_send((index, descriptor)).is_err() {
                    break;
                }
            });
        }
        drop(done_tx);

        tokio::spawn(reorder(done_rx, batch_tx, batch_size, total, cancel.clone()));

        DiscoveryStream {
            batches: batch_rx,
            cancel,
            finished: false,
        }
    }
}

/// Releases descriptors strictly in order; early finishers wait in `pending`
/// until the gap before them fills.
async fn reorder(
    mut done: mpsc::Receiver<(usize, ModDescriptor)>,
    batches: mpsc::Sender<Vec<ModDescriptor>>,
    batch_size: usize,
    total: usize,
    cancel: CancellationToken,
) {
    let mut pending: BTreeMap<usize, ModDescriptor> = BTreeMap::new();
    let mut cursor = 0;
    let mut batch = Vec::with_capacity(batch_size);

    loop {
        let received = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            item = done.recv() => item,
        };
        let Some((index, descriptor)) = received else {
            break;
        };
        pending.insert(index, descriptor);

        while let Some(descriptor) = pending.remove(&cursor) {
            cursor += 1;
            if !is_base_game_id(&descriptor.mod_id) {
                batch.push(descriptor);
            }
            if batch.len() == batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                if !send_batch(&batches, full, &cancel).await {
                    return;
                }
            }
        }
    }

    if cursor != total {
        // A worker died mid-source; keep what arrived, still in order.
        warn!(expected = total, received = cursor + pending.len(), "Discovery workers ended early");
        batch.extend(
            pending
                .into_values()
                .filter(|d| !is_base_game_id(&d.mod_id)),
        );
    }

    if !batch.is_empty() {
        send_batch(&batches, batch, &cancel).await;
    }
    debug!(processed = cursor, "Incremental discovery finished");
}

async fn send_batch(
    batches: &mpsc::Sender<Vec<ModDescriptor>>,
    batch: Vec<ModDescriptor>,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = batches.send(batch) => sent.is_ok(),
    }
}

/// Consumer side of incremental discovery.
pub struct DiscoveryStream {
    batches: mpsc::Receiver<Vec<ModDescriptor>>,
    cancel: CancellationToken,
    finished: bool,
}

impl DiscoveryStream {
    /// Next batch in discovery order; `None` once everything was delivered.
    /// After cancellation this yields `Err(ModError::Cancelled)` once, then `None`.
    pub async fn next(&mut self) -> Option<Result<Vec<ModDescriptor>, ModError>> {
        if self.finished {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.finished = true;
                Some(Err(ModError::Cancelled))
            }
            batch = self.batches.recv() => match batch {
                Some(batch) => Some(Ok(batch)),
                None => {
                    self.finished = true;
                    None
                }
            }
        }
    }

    /// Drains the stream into one list.
    pub async fn collect_all(mut self) -> Result<Vec<ModDescriptor>, ModError> {
        let mut all = Vec::new();
        while let Some(batch) = self.next().await {
            all.extend(batch?);
        }
        Ok(all)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DiscoveryStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
