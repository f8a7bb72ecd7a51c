//! Loader construction options.

/// Options for [`crate::DataLoader`].
#[derive(Clone, Copy, Debug)]
pub struct LoaderOptions {
    /// Samples per batch. The final batch may be shorter.
    pub batch_size: usize,
    /// Worker threads. `0` samples in-process on the calling thread.
    pub num_workers: usize,
    /// Capacity of the index queue and of the sample channel, in samples.
    ///
    /// Small values keep workers close to the parent's latest configuration;
    /// large values trade staleness for throughput.
    pub prefetch: usize,
}

impl LoaderOptions {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            num_workers: 0,
            prefetch: 4,
        }
    }

    #[must_use]
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    #[must_use]
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }
}
