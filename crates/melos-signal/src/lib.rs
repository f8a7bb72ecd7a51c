#![forbid(unsafe_code)]

//! Audio signal value types for the melos data pipeline.
//!
//! [`AudioSignal`] is a chunk of interleaved f32 PCM plus its sample rate;
//! [`SignalBatch`] stacks same-shaped signals along a new leading batch axis
//! while keeping per-item sample rate and duration observable. WAV read/write
//! covers the fixture formats the pipeline consumes.

mod batch;
mod error;
mod signal;
mod wav;

pub use batch::SignalBatch;
pub use error::{SignalError, SignalResult};
pub use signal::AudioSignal;
pub use wav::{read_wav, wav_spec, write_wav};
