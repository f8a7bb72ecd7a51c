#![forbid(unsafe_code)]

//! Manifest, dataset, and transform layer for the melos data pipeline.
//!
//! A CSV manifest enumerates audio files with duration and loudness
//! annotations. [`CsvDataset`] produces fixed-shape excerpts by index,
//! deterministic per `(seed, index)`, records transform parameters on each
//! sample, and collates samples into a [`Batch`]. Transform effects are
//! applied batch-wise with [`CsvDataset::augment`], keeping the gate decision
//! (recorded at sampling time) separate from the effect.

mod collate;
mod dataset;
mod error;
mod manifest;
mod rng;
mod transforms;

pub use collate::{collate, Batch};
pub use dataset::{CsvDataset, DatasetConfig, Sample, DEFAULT_DURATION};
pub use error::{DataError, DataResult};
pub use manifest::{create_manifest, find_audio, read_manifest, ManifestEntry};
pub use rng::Xorshift64;
pub use transforms::{Compose, Silence, Transform, TransformParams, TransformValue, VolumeJitter};
