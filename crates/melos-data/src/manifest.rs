//! CSV manifests enumerating an audio corpus.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use melos_signal::{read_wav, wav_spec};

use crate::{DataError, DataResult};

/// One manifest row: an audio file with its annotations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: PathBuf,
    /// Source file duration in seconds.
    pub duration: f64,
    /// RMS level in dBFS, when annotated.
    pub loudness: Option<f64>,
}

/// Recursively collect audio files under `dir` with one of the given
/// extensions (lowercase, without dot). Sorted for determinism.
pub fn find_audio<P: AsRef<Path>>(dir: P, exts: &[&str]) -> DataResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut stack = vec![dir.as_ref().to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.iter().any(|x| e.eq_ignore_ascii_case(x)))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Write a manifest for `files`, one row per file.
///
/// Duration comes from the WAV header. With `compute_loudness` the file is
/// read and annotated with its RMS dBFS level; otherwise the column is left
/// empty. Returns the number of rows written.
pub fn create_manifest<P: AsRef<Path>>(
    files: &[PathBuf],
    csv_path: P,
    compute_loudness: bool,
) -> DataResult<usize> {
    let mut writer = csv::Writer::from_path(csv_path.as_ref())?;
    for file in files {
        let (frames, _channels, sample_rate) = wav_spec(file)?;
        let duration = frames as f64 / f64::from(sample_rate);
        let loudness = if compute_loudness {
            Some(read_wav(file)?.rms_dbfs())
        } else {
            None
        };
        writer.serialize(ManifestEntry {
            path: file.clone(),
            duration,
            loudness,
        })?;
    }
    writer.flush()?;
    debug!(rows = files.len(), path = %csv_path.as_ref().display(), "manifest written");
    Ok(files.len())
}

/// Read a manifest back. Empty manifests are an error: a dataset cannot
/// sample from nothing.
pub fn read_manifest<P: AsRef<Path>>(csv_path: P) -> DataResult<Vec<ManifestEntry>> {
    let mut reader = csv::Reader::from_path(csv_path.as_ref())?;
    let entries: Vec<ManifestEntry> = reader.deserialize().collect::<Result<_, _>>()?;
    if entries.is_empty() {
        return Err(DataError::EmptyManifest(csv_path.as_ref().to_path_buf()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    use melos_signal::{write_wav, AudioSignal};

    fn tone(frames: usize, sample_rate: u32) -> AudioSignal {
        let pcm = (0..frames).map(|i| (i as f32 * 0.03).sin() * 0.4).collect();
        AudioSignal::new(pcm, 1, sample_rate).unwrap()
    }

    #[test]
    fn manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("spk");
        std::fs::create_dir(&nested).unwrap();

        for (i, frames) in [4000usize, 8000, 12000].iter().enumerate() {
            write_wav(nested.join(format!("{i}.wav")), &tone(*frames, 8000)).unwrap();
        }
        // A non-audio file that must not be picked up.
        std::fs::write(nested.join("notes.txt"), "x").unwrap();

        let files = find_audio(dir.path(), &["wav"]).unwrap();
        assert_eq!(files.len(), 3);

        let csv_path = dir.path().join("spk.csv");
        let rows = create_manifest(&files, &csv_path, true).unwrap();
        assert_eq!(rows, 3);

        let entries = read_manifest(&csv_path).unwrap();
        assert_eq!(entries.len(), 3);
        assert!((entries[0].duration - 0.5).abs() < 1e-6);
        assert!((entries[1].duration - 1.0).abs() < 1e-6);
        // A 0.4-peak sine sits well above digital silence.
        assert!(entries[0].loudness.unwrap() > -30.0);
        assert_eq!(entries[0].path, files[0]);
    }

    #[test]
    fn manifest_without_loudness_leaves_column_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path().join("a.wav"), &tone(800, 8000)).unwrap();

        let files = find_audio(dir.path(), &["wav"]).unwrap();
        let csv_path = dir.path().join("m.csv");
        create_manifest(&files, &csv_path, false).unwrap();

        let entries = read_manifest(&csv_path).unwrap();
        assert!(entries[0].loudness.is_none());
    }

    #[test]
    fn empty_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("empty.csv");
        create_manifest(&[], &csv_path, false).unwrap();
        assert!(matches!(
            read_manifest(&csv_path),
            Err(DataError::EmptyManifest(_))
        ));
    }
}
