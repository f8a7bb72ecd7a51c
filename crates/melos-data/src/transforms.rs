//! Randomized signal transforms.
//!
//! A transform separates its *gate/parameter decision* from its *effect*:
//! [`Transform::instantiate`] draws parameters from a deterministic stream
//! and records them on the sample; [`Transform::apply`] performs the effect
//! later using exactly those recorded parameters. The split means a collated
//! batch can be augmented post-hoc and the result is identical to inline
//! application.

use std::collections::BTreeMap;
use std::sync::Arc;

use melos_signal::AudioSignal;

use crate::{DataError, DataResult, Xorshift64};

/// Scalar value recorded by a transform and stacked per key in a batch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl TransformValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(v as f64),
            _ => None,
        }
    }
}

/// Per-sample transform parameters, keyed by declared output key.
pub type TransformParams = BTreeMap<String, TransformValue>;

/// A randomized, composable signal transform.
///
/// Implementations must be `Send + Sync`: one instance is shared across all
/// worker replicas behind an `Arc`, so any state set at construction time is
/// visible identically everywhere.
pub trait Transform: Send + Sync {
    /// Namespacing key for this transform's outputs in a batch.
    fn name(&self) -> &str;

    /// Declared output keys; stable across calls.
    fn keys(&self) -> Vec<String>;

    /// Draw parameters for one sample from `rng` and record them.
    ///
    /// Must populate every declared key and must not touch the signal.
    fn instantiate(&self, rng: &mut Xorshift64, signal: &AudioSignal) -> TransformParams;

    /// Apply the effect described by previously recorded `params`.
    fn apply(&self, signal: &mut AudioSignal, params: &TransformParams) -> DataResult<()>;
}

fn require(params: &TransformParams, transform: &str, key: &str) -> DataResult<TransformValue> {
    params
        .get(key)
        .copied()
        .ok_or_else(|| DataError::MissingKey {
            transform: transform.to_string(),
            key: key.to_string(),
        })
}

// ── Silence ─────────────────────────────────────────────────────────────

/// Probability-gated silencing.
///
/// The gate is drawn per sample and recorded under `mask`; when true the
/// effect replaces the signal with zeros of identical shape, otherwise the
/// signal is left untouched.
#[derive(Clone, Debug)]
pub struct Silence {
    prob: f64,
}

impl Silence {
    #[must_use]
    pub fn new(prob: f64) -> Self {
        Self {
            prob: prob.clamp(0.0, 1.0),
        }
    }

    pub fn prob(&self) -> f64 {
        self.prob
    }
}

impl Transform for Silence {
    fn name(&self) -> &str {
        "Silence"
    }

    fn keys(&self) -> Vec<String> {
        vec!["mask".to_string()]
    }

    fn instantiate(&self, rng: &mut Xorshift64, _signal: &AudioSignal) -> TransformParams {
        let mut params = TransformParams::new();
        params.insert("mask".to_string(), TransformValue::Bool(rng.next_bool(self.prob)));
        params
    }

    fn apply(&self, signal: &mut AudioSignal, params: &TransformParams) -> DataResult<()> {
        let mask = require(params, self.name(), "mask")?
            .as_bool()
            .ok_or_else(|| DataError::WrongValueType { key: "mask".into() })?;
        if mask {
            signal.zero();
        }
        Ok(())
    }
}

// ── VolumeJitter ────────────────────────────────────────────────────────

/// Random gain in dB, drawn per sample and recorded under `gain_db`.
#[derive(Clone, Debug)]
pub struct VolumeJitter {
    lo_db: f64,
    hi_db: f64,
}

impl VolumeJitter {
    #[must_use]
    pub fn new(lo_db: f64, hi_db: f64) -> Self {
        Self {
            lo_db: lo_db.min(hi_db),
            hi_db: lo_db.max(hi_db),
        }
    }
}

impl Transform for VolumeJitter {
    fn name(&self) -> &str {
        "VolumeJitter"
    }

    fn keys(&self) -> Vec<String> {
        vec!["gain_db".to_string()]
    }

    fn instantiate(&self, rng: &mut Xorshift64, _signal: &AudioSignal) -> TransformParams {
        let mut params = TransformParams::new();
        params.insert(
            "gain_db".to_string(),
            TransformValue::Float(rng.range_f64(self.lo_db, self.hi_db)),
        );
        params
    }

    fn apply(&self, signal: &mut AudioSignal, params: &TransformParams) -> DataResult<()> {
        let gain_db = require(params, self.name(), "gain_db")?
            .as_f64()
            .ok_or_else(|| DataError::WrongValueType {
                key: "gain_db".into(),
            })?;
        signal.scale(10f32.powf(gain_db as f32 / 20.0));
        Ok(())
    }
}

// ── Compose ─────────────────────────────────────────────────────────────

/// Applies child transforms in order, namespacing each child's keys as
/// `ChildName.key`.
///
/// Repeated child names get an ordinal suffix (`Silence`, `Silence_2`, ...)
/// so their keys cannot collide.
pub struct Compose {
    children: Vec<(String, Arc<dyn Transform>)>,
}

impl Compose {
    #[must_use]
    pub fn new(children: Vec<Arc<dyn Transform>>) -> Self {
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let children = children
            .into_iter()
            .map(|child| {
                let n = seen.entry(child.name().to_string()).or_insert(0);
                *n += 1;
                let label = if *n == 1 {
                    child.name().to_string()
                } else {
                    format!("{}_{n}", child.name())
                };
                (label, child)
            })
            .collect();
        Self { children }
    }
}

impl Transform for Compose {
    fn name(&self) -> &str {
        "Compose"
    }

    fn keys(&self) -> Vec<String> {
        self.children
            .iter()
            .flat_map(|(label, c)| {
                let label = label.clone();
                c.keys().into_iter().map(move |k| format!("{label}.{k}"))
            })
            .collect()
    }

    fn instantiate(&self, rng: &mut Xorshift64, signal: &AudioSignal) -> TransformParams {
        let mut params = TransformParams::new();
        for (label, child) in &self.children {
            for (key, value) in child.instantiate(rng, signal) {
                params.insert(format!("{label}.{key}"), value);
            }
        }
        params
    }

    fn apply(&self, signal: &mut AudioSignal, params: &TransformParams) -> DataResult<()> {
        for (label, child) in &self.children {
            let prefix = format!("{label}.");
            let child_params: TransformParams = params
                .iter()
                .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|k| (k.to_string(), *v)))
                .collect();
            child.apply(signal, &child_params)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone() -> AudioSignal {
        let pcm = (0..400).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        AudioSignal::new(pcm, 1, 8000).unwrap()
    }

    #[test]
    fn silence_gate_true_zeroes_gate_false_preserves() {
        let tfm = Silence::new(0.5);
        let original = tone();

        let gated: TransformParams =
            [("mask".to_string(), TransformValue::Bool(true))].into();
        let mut sig = original.clone();
        tfm.apply(&mut sig, &gated).unwrap();
        assert!(sig.is_silent(0.0));

        let open: TransformParams =
            [("mask".to_string(), TransformValue::Bool(false))].into();
        let mut sig = original.clone();
        tfm.apply(&mut sig, &open).unwrap();
        assert_eq!(sig, original);
    }

    #[test]
    fn silence_gate_rate_tracks_probability() {
        let tfm = Silence::new(0.5);
        let sig = tone();
        let mut rng = Xorshift64::new(123);
        let hits = (0..10_000)
            .filter(|_| {
                tfm.instantiate(&mut rng, &sig)["mask"]
                    .as_bool()
                    .unwrap()
            })
            .count();
        assert!((4_600..5_400).contains(&hits));
    }

    #[test]
    fn instantiate_is_deterministic_per_stream() {
        let tfm = VolumeJitter::new(-6.0, 6.0);
        let sig = tone();
        let a = tfm.instantiate(&mut Xorshift64::for_index(9, 4), &sig);
        let b = tfm.instantiate(&mut Xorshift64::for_index(9, 4), &sig);
        assert_eq!(a, b);
    }

    #[test]
    fn apply_without_recorded_params_is_an_error() {
        let tfm = Silence::new(1.0);
        let mut sig = tone();
        let err = tfm.apply(&mut sig, &TransformParams::new()).unwrap_err();
        assert!(matches!(err, DataError::MissingKey { .. }));
    }

    #[test]
    fn compose_namespaces_child_keys() {
        let tfm = Compose::new(vec![
            Arc::new(Silence::new(1.0)),
            Arc::new(VolumeJitter::new(-3.0, 3.0)),
        ]);
        assert_eq!(
            tfm.keys(),
            vec!["Silence.mask".to_string(), "VolumeJitter.gain_db".to_string()]
        );

        let sig = tone();
        let params = tfm.instantiate(&mut Xorshift64::new(1), &sig);
        assert!(params["Silence.mask"].as_bool().unwrap());

        let mut out = sig.clone();
        tfm.apply(&mut out, &params).unwrap();
        // Silence fires (prob 1.0), so gain afterwards does not matter.
        assert!(out.is_silent(0.0));
    }

    #[test]
    fn compose_disambiguates_duplicate_child_names() {
        // Two fixed-gain jitters that cancel each other out.
        let tfm = Compose::new(vec![
            Arc::new(VolumeJitter::new(-6.0, -6.0)),
            Arc::new(VolumeJitter::new(6.0, 6.0)),
        ]);
        assert_eq!(
            tfm.keys(),
            vec![
                "VolumeJitter.gain_db".to_string(),
                "VolumeJitter_2.gain_db".to_string()
            ]
        );

        let sig = tone();
        let params = tfm.instantiate(&mut Xorshift64::new(7), &sig);
        assert_eq!(params.len(), 2);
        assert_eq!(params["VolumeJitter.gain_db"].as_f64().unwrap(), -6.0);
        assert_eq!(params["VolumeJitter_2.gain_db"].as_f64().unwrap(), 6.0);

        let mut out = sig.clone();
        tfm.apply(&mut out, &params).unwrap();
        assert!(out.allclose(&sig, 1e-4));
    }
}
