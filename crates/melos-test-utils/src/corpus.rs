//! Synthetic WAV corpus and manifest fixtures.

use std::path::{Path, PathBuf};

use melos_data::{create_manifest, find_audio};
use melos_signal::{write_wav, AudioSignal};

/// Write a mono sine tone WAV file.
pub fn write_tone_wav<P: AsRef<Path>>(path: P, freq_hz: f32, sample_rate: u32, frames: usize) {
    let step = std::f32::consts::TAU * freq_hz / sample_rate as f32;
    let pcm = (0..frames).map(|i| (i as f32 * step).sin() * 0.4).collect();
    let signal = AudioSignal::new(pcm, 1, sample_rate).unwrap();
    write_wav(path, &signal).unwrap();
}

/// Build a small speaker-like corpus under `dir` and write its manifest.
///
/// Four tones of different pitch and length (0.5 s to 1.25 s at 8 kHz),
/// loudness-annotated. Returns the manifest path.
pub fn corpus_manifest(dir: &Path) -> PathBuf {
    let spk = dir.join("spk");
    std::fs::create_dir_all(&spk).unwrap();

    let sample_rate = 8000;
    for (i, (freq, frames)) in [(220.0, 4000), (330.0, 6000), (440.0, 8000), (550.0, 10000)]
        .into_iter()
        .enumerate()
    {
        write_tone_wav(spk.join(format!("spk_{i}.wav")), freq, sample_rate, frames);
    }

    let files = find_audio(&spk, &["wav"]).unwrap();
    let manifest = dir.join("spk.csv");
    create_manifest(&files, &manifest, true).unwrap();
    manifest
}
