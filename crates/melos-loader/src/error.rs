use thiserror::Error;

use melos_data::DataError;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid loader options: {0}")]
    InvalidOptions(String),

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("worker pool disconnected")]
    Disconnected,
}

pub type LoaderResult<T> = Result<T, LoaderError>;
