use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),

    #[error("invalid signal spec: {0}")]
    InvalidSpec(String),

    #[error("pcm length {len} is not aligned to {channels} channels")]
    Misaligned { len: usize, channels: u16 },

    #[error("cannot stack an empty list of signals")]
    EmptyBatch,

    #[error(
        "shape mismatch at batch position {index}: expected {expected_frames} frames x {expected_channels} ch, got {frames} frames x {channels} ch"
    )]
    ShapeMismatch {
        index: usize,
        expected_frames: usize,
        expected_channels: u16,
        frames: usize,
        channels: u16,
    },

    #[error("batch index {index} out of range for batch of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type SignalResult<T> = Result<T, SignalError>;
