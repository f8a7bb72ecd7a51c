//! Batch dispatcher over a pool of sampling workers.

use std::collections::BTreeMap;
use std::thread::JoinHandle;

use tracing::{debug, trace};

use melos_data::{Batch, CsvDataset, DatasetConfig, Sample};

use crate::worker::{run_worker, WorkerContext, WorkerReply};
use crate::{ConfigCell, ConfigView, LoaderError, LoaderOptions, LoaderResult};

/// Pulls batches from a dataset, optionally through worker threads.
///
/// The loader walks indices `0..dataset.len()` once, in order, and yields
/// `ceil(len / batch_size)` batches (the last one may be short). The parent
/// may change `duration`/`sample_rate` at any point between batch receipts;
/// the loader pins one snapshot per batch window when its first index goes
/// out, so every sample of a batch shares a shape and updates take effect
/// from the next window that starts after they were published.
pub struct DataLoader {
    dataset: CsvDataset,
    options: LoaderOptions,
    config: ConfigCell,
    emitted: usize,
    backend: Backend,
}

enum Backend {
    /// `num_workers == 0`: sample on the calling thread.
    Inline { view: ConfigView, next_index: usize },
    Pool(Pool),
}

struct Pool {
    index_tx: Option<kanal::Sender<(usize, DatasetConfig)>>,
    reply_rx: Option<kanal::Receiver<WorkerReply>>,
    handles: Vec<JoinHandle<()>>,
    /// Out-of-order arrivals waiting for their turn.
    pending: BTreeMap<usize, Sample>,
    next_out: usize,
    dispatched: usize,
    batch_size: usize,
    config: ConfigCell,
    /// Snapshot pinned for the batch window currently being dispatched.
    pinned: DatasetConfig,
}

impl DataLoader {
    pub fn new(dataset: CsvDataset, options: LoaderOptions) -> LoaderResult<Self> {
        if options.batch_size == 0 {
            return Err(LoaderError::InvalidOptions(
                "batch_size must be >= 1".into(),
            ));
        }

        let config = ConfigCell::new(dataset.config());
        let backend = if options.num_workers == 0 {
            Backend::Inline {
                view: config.subscribe(),
                next_index: 0,
            }
        } else {
            Backend::Pool(Pool::spawn(&dataset, &config, &options))
        };

        Ok(Self {
            dataset,
            options,
            config,
            emitted: 0,
            backend,
        })
    }

    /// Parent-side configuration handle (clonable).
    #[must_use]
    pub fn config(&self) -> ConfigCell {
        self.config.clone()
    }

    pub fn duration(&self) -> f64 {
        self.config.snapshot().duration
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.snapshot().sample_rate
    }

    pub fn set_duration(&self, duration: f64) {
        self.config.set_duration(duration);
    }

    pub fn set_sample_rate(&self, sample_rate: u32) {
        self.config.set_sample_rate(sample_rate);
    }

    /// Batches this loader yields in total.
    pub fn n_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.options.batch_size)
    }

    /// Assemble the next batch, blocking until its samples arrive.
    ///
    /// Returns `Ok(None)` once all `dataset.len()` samples were emitted.
    pub fn next_batch(&mut self) -> LoaderResult<Option<Batch>> {
        let total = self.dataset.len();
        let remaining = total - self.emitted;
        if remaining == 0 {
            if let Backend::Pool(pool) = &mut self.backend {
                pool.shutdown();
            }
            return Ok(None);
        }
        let take = remaining.min(self.options.batch_size);

        let mut samples = Vec::with_capacity(take);
        match &mut self.backend {
            Backend::Inline { view, next_index } => {
                // One snapshot for the whole batch, same pinning as the pool.
                let snapshot = view.latest();
                for _ in 0..take {
                    samples.push(self.dataset.get_with(*next_index, &snapshot)?);
                    *next_index += 1;
                }
            }
            Backend::Pool(pool) => {
                while samples.len() < take {
                    pool.refill(total)?;
                    if let Some(sample) = pool.pop_in_order() {
                        samples.push(sample);
                        continue;
                    }
                    let sample = pool.recv()??;
                    pool.pending.insert(sample.index, sample);
                }
            }
        }

        self.emitted += take;
        debug!(
            emitted = self.emitted,
            batch_len = take,
            "batch assembled"
        );
        Ok(Some(self.dataset.collate(samples)?))
    }
}

impl Pool {
    fn spawn(dataset: &CsvDataset, config: &ConfigCell, options: &LoaderOptions) -> Self {
        let (index_tx, index_rx) = kanal::bounded::<(usize, DatasetConfig)>(options.prefetch);
        let (reply_tx, reply_rx) = kanal::bounded::<WorkerReply>(options.prefetch);

        let handles = (0..options.num_workers)
            .map(|id| {
                let ctx = WorkerContext {
                    id,
                    dataset: dataset.clone(),
                    index_rx: index_rx.clone(),
                    reply_tx: reply_tx.clone(),
                };
                std::thread::spawn(move || run_worker(ctx))
            })
            .collect();
        debug!(
            num_workers = options.num_workers,
            prefetch = options.prefetch,
            "worker pool started"
        );

        Self {
            index_tx: Some(index_tx),
            reply_rx: Some(reply_rx),
            handles,
            pending: BTreeMap::new(),
            next_out: 0,
            dispatched: 0,
            batch_size: options.batch_size,
            config: config.clone(),
            pinned: config.snapshot(),
        }
    }

    /// Top the index queue up without blocking. Indices go out in order, so
    /// every index below `dispatched` is somewhere in flight.
    ///
    /// At each batch-window boundary the latest parent snapshot is pinned
    /// and attached to every index of that window.
    fn refill(&mut self, total: usize) -> LoaderResult<()> {
        let Some(index_tx) = &self.index_tx else {
            return Ok(());
        };
        while self.dispatched < total {
            if self.dispatched % self.batch_size == 0 {
                self.pinned = self.config.snapshot();
            }
            let mut slot = Some((self.dispatched, self.pinned));
            match index_tx.try_send_option(&mut slot) {
                Ok(true) => {
                    trace!(index = self.dispatched, "index dispatched");
                    self.dispatched += 1;
                }
                Ok(false) => break, // queue full
                Err(_) => return Err(LoaderError::Disconnected),
            }
        }
        if self.dispatched == total {
            // Every index is out; let workers drain and exit.
            self.index_tx = None;
        }
        Ok(())
    }

    fn pop_in_order(&mut self) -> Option<Sample> {
        let sample = self.pending.remove(&self.next_out)?;
        self.next_out += 1;
        Some(sample)
    }

    fn recv(&mut self) -> LoaderResult<WorkerReply> {
        let reply_rx = self.reply_rx.as_ref().ok_or(LoaderError::Disconnected)?;
        reply_rx.recv().map_err(|_| LoaderError::Disconnected)
    }

    fn shutdown(&mut self) {
        // Dropping both endpoints unblocks any worker parked on recv/send.
        self.index_tx = None;
        self.reply_rx = None;
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("a.wav");
        let sig = melos_signal::AudioSignal::silence(800, 1, 8000).unwrap();
        melos_signal::write_wav(&wav, &sig).unwrap();
        let csv = dir.path().join("m.csv");
        melos_data::create_manifest(&[wav], &csv, false).unwrap();
        let dataset = CsvDataset::new(8000, 4, &[&csv], 1).unwrap();

        assert!(matches!(
            DataLoader::new(dataset, LoaderOptions::new(0)),
            Err(LoaderError::InvalidOptions(_))
        ));
    }
}
