use std::path::PathBuf;

use thiserror::Error;

use melos_signal::SignalError;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("manifest {0} contains no entries")]
    EmptyManifest(PathBuf),

    #[error("dataset has no manifest entries")]
    NoEntries,

    #[error("cannot collate an empty list of samples")]
    EmptyBatch,

    #[error("index {index} out of range for dataset of {len} examples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("sample at batch position {index} carries no transform parameters")]
    MissingParams { index: usize },

    #[error("transform {transform} declared key {key} but did not produce it")]
    MissingKey { transform: String, key: String },

    #[error("batch has no outputs for transform {0}")]
    MissingOutputs(String),

    #[error("transform output {key} has unexpected value type")]
    WrongValueType { key: String },
}

pub type DataResult<T> = Result<T, DataError>;
