#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

//! Shared test fixtures for the melos workspace.

pub mod corpus;

pub use corpus::{corpus_manifest, write_tone_wav};

/// Initialize test tracing once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("melos_loader=debug".parse().unwrap())
                .add_directive("melos_data=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}
