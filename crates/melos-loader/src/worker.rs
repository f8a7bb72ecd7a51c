//! Worker thread loop.

use tracing::trace;

use melos_data::{CsvDataset, DataResult, DatasetConfig, Sample};

/// Sample result; successful samples carry their dataset index for in-order
/// reassembly.
pub(crate) type WorkerReply = DataResult<Sample>;

pub(crate) struct WorkerContext {
    pub id: usize,
    /// Replica of the parent's dataset, cloned at pool construction.
    pub dataset: CsvDataset,
    pub index_rx: kanal::Receiver<(usize, DatasetConfig)>,
    pub reply_tx: kanal::Sender<WorkerReply>,
}

/// Run a blocking worker loop: pull an index with its pinned configuration
/// snapshot, produce the sample, send it back.
///
/// The snapshot travels with the index: the dispatcher pins one parent-issued
/// snapshot per batch window, so every sample of a batch shares a shape and
/// everything a worker observes was published by the parent. Exits when the
/// index queue closes or the dispatcher goes away.
pub(crate) fn run_worker(ctx: WorkerContext) {
    trace!(worker = ctx.id, "worker started");
    while let Ok((index, config)) = ctx.index_rx.recv() {
        trace!(
            worker = ctx.id,
            index,
            sample_rate = config.sample_rate,
            "producing sample"
        );
        let reply = ctx.dataset.get_with(index, &config);
        if ctx.reply_tx.send(reply).is_err() {
            break;
        }
    }
    trace!(worker = ctx.id, "worker stopped");
}
