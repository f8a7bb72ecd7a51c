#![forbid(unsafe_code)]

//! Worker-pool batch loader with live configuration propagation.
//!
//! The parent holds a [`DataLoader`] and keeps publishing configuration
//! updates (clip duration, sample rate) through a [`ConfigCell`] while
//! batches are being assembled. The dispatcher pins the latest snapshot at
//! each batch-window boundary and worker threads (cloned dataset replicas)
//! produce every sample of that window under the pinned snapshot, so batches
//! stay uniform in shape and updates propagate best-effort: a window may
//! skip intermediate values but can never observe a value the parent did
//! not publish.
//!
//! With `num_workers == 0` no threads are spawned and samples are drawn
//! in-process under the same snapshot discipline.

mod config;
mod error;
mod loader;
mod options;
mod worker;

pub use config::{ConfigCell, ConfigView};
pub use error::{LoaderError, LoaderResult};
pub use loader::DataLoader;
pub use options::LoaderOptions;
