//! CSV-manifest-backed dataset.

use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use melos_signal::{read_wav, AudioSignal};

use crate::{
    collate, Batch, DataError, DataResult, ManifestEntry, Transform, TransformParams, Xorshift64,
};

/// Default clip duration in seconds.
pub const DEFAULT_DURATION: f64 = 0.5;

/// The dataset's mutable configuration: one `Copy` snapshot, published
/// whole so readers never observe a torn value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatasetConfig {
    /// Clip duration in seconds.
    pub duration: f64,
    /// Target sample rate in Hz.
    pub sample_rate: u32,
}

impl DatasetConfig {
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            duration: DEFAULT_DURATION,
            sample_rate,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Frames one clip spans at this configuration.
    pub fn clip_frames(&self) -> usize {
        ((self.duration * f64::from(self.sample_rate)).round() as usize).max(1)
    }
}

/// One dataset-produced unit: the excerpted signal plus the transform
/// parameters recorded for it (the effect is applied later, batch-wise).
#[derive(Clone, Debug)]
pub struct Sample {
    pub index: usize,
    pub signal: AudioSignal,
    pub params: Option<TransformParams>,
}

/// Dataset over one or more CSV manifests.
///
/// Cloning a `CsvDataset` is how worker replicas are made: entries and
/// transform are shared (`Arc`), the configuration is copied. Sampling is
/// deterministic per `(seed, index)` regardless of which replica runs it.
#[derive(Clone)]
pub struct CsvDataset {
    entries: Arc<Vec<ManifestEntry>>,
    n_examples: usize,
    config: DatasetConfig,
    seed: u64,
    transform: Option<Arc<dyn Transform>>,
}

impl CsvDataset {
    /// Read the given manifests and build a dataset of `n_examples` virtual
    /// examples over their concatenated entries.
    pub fn new<P: AsRef<Path>>(
        sample_rate: u32,
        n_examples: usize,
        csv_files: &[P],
        seed: u64,
    ) -> DataResult<Self> {
        let mut entries = Vec::new();
        for csv_file in csv_files {
            entries.extend(crate::read_manifest(csv_file)?);
        }
        if entries.is_empty() {
            return Err(DataError::NoEntries);
        }
        Ok(Self {
            entries: Arc::new(entries),
            n_examples,
            config: DatasetConfig::new(sample_rate),
            seed,
            transform: None,
        })
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn len(&self) -> usize {
        self.n_examples
    }

    pub fn is_empty(&self) -> bool {
        self.n_examples == 0
    }

    pub fn config(&self) -> DatasetConfig {
        self.config
    }

    pub fn set_config(&mut self, config: DatasetConfig) {
        self.config = config;
    }

    pub fn duration(&self) -> f64 {
        self.config.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.config.duration = duration;
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.config.sample_rate = sample_rate;
    }

    pub fn transform(&self) -> Option<&Arc<dyn Transform>> {
        self.transform.as_ref()
    }

    /// Produce the sample at `index` using this replica's current config.
    pub fn get(&self, index: usize) -> DataResult<Sample> {
        self.get_with(index, &self.config)
    }

    /// Produce the sample at `index` under an explicit config snapshot.
    ///
    /// The excerpt offset and transform parameters come from the per-index
    /// stream, so the same `(seed, index, config)` always yields the same
    /// sample on any replica.
    pub fn get_with(&self, index: usize, config: &DatasetConfig) -> DataResult<Sample> {
        if index >= self.n_examples {
            return Err(DataError::IndexOutOfRange {
                index,
                len: self.n_examples,
            });
        }

        let entry = &self.entries[index % self.entries.len()];
        let source = read_wav(&entry.path)?.resample_linear(config.sample_rate);
        let target_frames = config.clip_frames();

        let mut rng = Xorshift64::for_index(self.seed, index as u64);
        let offset = if source.frames() > target_frames {
            rng.range_u64(0, (source.frames() - target_frames + 1) as u64) as usize
        } else {
            0
        };
        let signal = source.excerpt(offset, target_frames);

        let params = self
            .transform
            .as_ref()
            .map(|t| t.instantiate(&mut rng, &signal));

        trace!(
            index,
            offset,
            frames = target_frames,
            sample_rate = config.sample_rate,
            "sampled"
        );
        Ok(Sample {
            index,
            signal,
            params,
        })
    }

    /// Merge samples into a batch, stacking signals and per-transform
    /// outputs in order. See [`collate`].
    pub fn collate(&self, samples: Vec<Sample>) -> DataResult<Batch> {
        collate(samples, self.transform.as_deref())
    }

    /// Apply this dataset's transform to an already-materialized batch using
    /// the parameters recorded at sampling time.
    ///
    /// The stacked `signal` is rewritten item by item; the pre-transform
    /// `original` copy is left untouched. Without a transform this is a
    /// no-op.
    pub fn augment(&self, batch: &mut Batch) -> DataResult<()> {
        let Some(transform) = &self.transform else {
            return Ok(());
        };
        let outputs = batch
            .transforms
            .get(transform.name())
            .ok_or_else(|| DataError::MissingOutputs(transform.name().to_string()))?
            .clone();

        for i in 0..batch.len() {
            let params: TransformParams = outputs
                .iter()
                .map(|(key, column)| (key.clone(), column[i]))
                .collect();
            let mut signal = batch.signal.item(i)?;
            transform.apply(&mut signal, &params)?;
            batch.signal.set_item(i, &signal)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use melos_signal::write_wav;

    use crate::{create_manifest, find_audio, Silence, TransformValue};

    /// Three short tones plus a manifest in a temp dir.
    fn fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        for (i, frames) in [8000usize, 12000, 16000].iter().enumerate() {
            let pcm = (0..*frames).map(|n| (n as f32 * 0.01).sin() * 0.3).collect();
            let sig = AudioSignal::new(pcm, 1, 8000).unwrap();
            write_wav(dir.path().join(format!("{i}.wav")), &sig).unwrap();
        }
        let files = find_audio(dir.path(), &["wav"]).unwrap();
        let csv_path = dir.path().join("spk.csv");
        create_manifest(&files, &csv_path, true).unwrap();
        (dir, csv_path)
    }

    #[test]
    fn get_honors_config_shape() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(16000, 10, &[&csv], 7).unwrap();

        let sample = dataset.get(0).unwrap();
        assert_eq!(sample.signal.sample_rate, 16000);
        assert_eq!(sample.signal.frames(), 8000); // 0.5 s at 16 kHz

        let cfg = DatasetConfig {
            duration: 0.25,
            sample_rate: 8000,
        };
        let sample = dataset.get_with(0, &cfg).unwrap();
        assert_eq!(sample.signal.sample_rate, 8000);
        assert_eq!(sample.signal.frames(), 2000);
    }

    #[test]
    fn get_is_deterministic_per_index() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(8000, 10, &[&csv], 42)
            .unwrap()
            .with_transform(Arc::new(Silence::new(0.5)));

        let a = dataset.get(3).unwrap();
        let b = dataset.get(3).unwrap();
        assert_eq!(a.index, 3);
        assert_eq!(a.signal, b.signal);
        assert_eq!(a.params, b.params);

        // A replica (clone) agrees sample for sample.
        let replica = dataset.clone();
        let c = replica.get(3).unwrap();
        assert_eq!(a.signal, c.signal);
        assert_eq!(a.params, c.params);
    }

    #[test]
    fn indexing_wraps_over_manifest_entries() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(8000, 100, &[&csv], 1).unwrap();
        assert_eq!(dataset.len(), 100);
        // Index 3 wraps to entry 0; both read the same file and stream.
        let a = dataset.get(0).unwrap();
        let b = dataset.get(3).unwrap();
        assert_eq!(a.signal.frames(), b.signal.frames());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(8000, 5, &[&csv], 1).unwrap();
        assert!(matches!(
            dataset.get(5),
            Err(DataError::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn augment_zeroes_masked_items_only() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(8000, 16, &[&csv], 99)
            .unwrap()
            .with_transform(Arc::new(Silence::new(0.5)));

        let samples: Vec<Sample> = (0..16).map(|i| dataset.get(i).unwrap()).collect();
        let mut batch = dataset.collate(samples).unwrap();
        dataset.augment(&mut batch).unwrap();

        let original = batch.original.as_ref().unwrap();
        let mask = batch.bool_column("Silence", "mask").unwrap();
        assert!(mask.iter().any(|&m| m) && mask.iter().any(|&m| !m));

        for (i, &masked) in mask.iter().enumerate() {
            let item = batch.signal.item(i).unwrap();
            if masked {
                assert!(item.is_silent(0.0));
            } else {
                assert_eq!(item, original.item(i).unwrap());
            }
        }
    }

    #[test]
    fn augment_matches_recorded_params() {
        let (_dir, csv) = fixture();
        let dataset = CsvDataset::new(8000, 4, &[&csv], 5)
            .unwrap()
            .with_transform(Arc::new(Silence::new(0.7)));

        let samples: Vec<Sample> = (0..4).map(|i| dataset.get(i).unwrap()).collect();
        let recorded: Vec<TransformValue> = samples
            .iter()
            .map(|s| s.params.as_ref().unwrap()["mask"])
            .collect();

        let batch = dataset.collate(samples).unwrap();
        let column = batch.column("Silence", "mask").unwrap();
        assert_eq!(column, &recorded[..]);

        // Re-instantiating from the same stream reproduces the batch column.
        for (i, value) in recorded.iter().enumerate() {
            let again = dataset.get(i).unwrap();
            assert_eq!(again.params.unwrap()["mask"], *value);
        }
    }
}
