//! Merging samples into batches.

use std::collections::BTreeMap;

use melos_signal::SignalBatch;

use crate::{DataError, DataResult, Sample, Transform, TransformValue};

/// Samples merged along a new leading batch axis.
///
/// `signal` stacks the (possibly to-be-augmented) item signals; `original`
/// preserves the pre-transform copy when a transform is active. Transform
/// outputs are stacked per declared key under the transform's name, in batch
/// order, so position `i` of any column belongs to item `i` of the batch.
#[derive(Clone, Debug)]
pub struct Batch {
    pub signal: SignalBatch,
    pub original: Option<SignalBatch>,
    pub transforms: BTreeMap<String, BTreeMap<String, Vec<TransformValue>>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Stacked column for one transform key.
    pub fn column(&self, transform: &str, key: &str) -> DataResult<&[TransformValue]> {
        self.transforms
            .get(transform)
            .ok_or_else(|| DataError::MissingOutputs(transform.to_string()))?
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| DataError::MissingKey {
                transform: transform.to_string(),
                key: key.to_string(),
            })
    }

    /// Boolean column (e.g. a gate mask).
    pub fn bool_column(&self, transform: &str, key: &str) -> DataResult<Vec<bool>> {
        self.column(transform, key)?
            .iter()
            .map(|v| {
                v.as_bool().ok_or_else(|| DataError::WrongValueType {
                    key: key.to_string(),
                })
            })
            .collect()
    }

    /// Float column.
    pub fn float_column(&self, transform: &str, key: &str) -> DataResult<Vec<f64>> {
        self.column(transform, key)?
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| DataError::WrongValueType {
                    key: key.to_string(),
                })
            })
            .collect()
    }

    /// Integer column.
    pub fn int_column(&self, transform: &str, key: &str) -> DataResult<Vec<i64>> {
        self.column(transform, key)?
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| DataError::WrongValueType {
                    key: key.to_string(),
                })
            })
            .collect()
    }
}

/// Stack samples into a [`Batch`], preserving their order.
///
/// With an active transform, every sample must carry recorded parameters for
/// each declared key, and a pre-transform `original` copy of the stacked
/// signal is kept.
pub fn collate(samples: Vec<Sample>, transform: Option<&dyn Transform>) -> DataResult<Batch> {
    if samples.is_empty() {
        return Err(DataError::EmptyBatch);
    }

    let mut signals = Vec::with_capacity(samples.len());
    let mut params = Vec::with_capacity(samples.len());
    for sample in samples {
        signals.push(sample.signal);
        params.push(sample.params);
    }
    let signal = SignalBatch::stack(signals)?;

    let mut transforms = BTreeMap::new();
    let original = transform.is_some().then(|| signal.clone());
    if let Some(t) = transform {
        let keys = t.keys();
        let mut columns: BTreeMap<String, Vec<TransformValue>> = keys
            .iter()
            .map(|k| (k.clone(), Vec::with_capacity(params.len())))
            .collect();
        for (index, sample_params) in params.iter().enumerate() {
            let sample_params = sample_params
                .as_ref()
                .ok_or(DataError::MissingParams { index })?;
            for key in &keys {
                let value =
                    sample_params
                        .get(key)
                        .copied()
                        .ok_or_else(|| DataError::MissingKey {
                            transform: t.name().to_string(),
                            key: key.clone(),
                        })?;
                columns
                    .get_mut(key)
                    .ok_or_else(|| DataError::MissingKey {
                        transform: t.name().to_string(),
                        key: key.clone(),
                    })?
                    .push(value);
            }
        }
        transforms.insert(t.name().to_string(), columns);
    }

    Ok(Batch {
        signal,
        original,
        transforms,
    })
}
