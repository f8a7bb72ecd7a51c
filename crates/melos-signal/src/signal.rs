//! Interleaved PCM signal.

use crate::{SignalError, SignalResult};

/// A chunk of interleaved f32 PCM with its sample rate.
///
/// The PCM length must be frame-aligned (divisible by the channel count).
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSignal {
    /// Interleaved samples, `frames * channels` long.
    pub pcm: Vec<f32>,
    /// Channel count, at least 1.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioSignal {
    /// Create a signal, validating channel count and frame alignment.
    pub fn new(pcm: Vec<f32>, channels: u16, sample_rate: u32) -> SignalResult<Self> {
        if channels == 0 {
            return Err(SignalError::InvalidSpec("channels must be >= 1".into()));
        }
        if sample_rate == 0 {
            return Err(SignalError::InvalidSpec("sample_rate must be >= 1".into()));
        }
        if pcm.len() % channels as usize != 0 {
            return Err(SignalError::Misaligned {
                len: pcm.len(),
                channels,
            });
        }
        Ok(Self {
            pcm,
            channels,
            sample_rate,
        })
    }

    /// All-zero signal of the given shape.
    pub fn silence(frames: usize, channels: u16, sample_rate: u32) -> SignalResult<Self> {
        Self::new(vec![0.0; frames * channels as usize], channels, sample_rate)
    }

    /// All-zero signal with the same shape and sample rate as `self`.
    #[must_use]
    pub fn zeros_like(&self) -> Self {
        Self {
            pcm: vec![0.0; self.pcm.len()],
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    pub fn frames(&self) -> usize {
        self.pcm.len() / self.channels as usize
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// True when every sample of `other` is within `tol` of `self` and the
    /// shapes match.
    #[must_use]
    pub fn allclose(&self, other: &Self, tol: f32) -> bool {
        self.channels == other.channels
            && self.pcm.len() == other.pcm.len()
            && self
                .pcm
                .iter()
                .zip(other.pcm.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    pub fn is_silent(&self, tol: f32) -> bool {
        self.pcm.iter().all(|s| s.abs() <= tol)
    }

    pub fn peak(&self) -> f32 {
        self.pcm.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Root-mean-square amplitude.
    pub fn rms(&self) -> f32 {
        if self.pcm.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.pcm.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        (sum / self.pcm.len() as f64).sqrt() as f32
    }

    /// RMS level in dBFS. Digital silence maps to -120 dB.
    pub fn rms_dbfs(&self) -> f64 {
        let rms = f64::from(self.rms());
        if rms <= 1e-6 {
            -120.0
        } else {
            20.0 * rms.log10()
        }
    }

    /// Scale every sample in place.
    pub fn scale(&mut self, gain: f32) {
        for s in &mut self.pcm {
            *s *= gain;
        }
    }

    /// Replace all samples with zeros in place.
    pub fn zero(&mut self) {
        self.pcm.fill(0.0);
    }

    /// Copy a window of `len_frames` frames starting at `offset_frames`.
    ///
    /// Reads past the end of the signal are zero-padded so the result always
    /// has exactly `len_frames` frames.
    #[must_use]
    pub fn excerpt(&self, offset_frames: usize, len_frames: usize) -> Self {
        let ch = self.channels as usize;
        let mut pcm = vec![0.0f32; len_frames * ch];
        let start = offset_frames.min(self.frames());
        let avail = (self.frames() - start).min(len_frames);
        let src = &self.pcm[start * ch..(start + avail) * ch];
        pcm[..src.len()].copy_from_slice(src);
        Self {
            pcm,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Resample to `target_rate` with linear interpolation.
    ///
    /// Pipeline plumbing, not a codec-grade resampler: good enough to bring
    /// manifest audio to the dataset's requested rate.
    #[must_use]
    pub fn resample_linear(&self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate {
            return self.clone();
        }
        if self.frames() == 0 {
            let mut out = self.clone();
            out.sample_rate = target_rate;
            return out;
        }

        let ch = self.channels as usize;
        let in_frames = self.frames();
        let out_frames = ((in_frames as f64) * f64::from(target_rate)
            / f64::from(self.sample_rate))
        .round()
        .max(1.0) as usize;
        let step = f64::from(self.sample_rate) / f64::from(target_rate);

        let mut pcm = vec![0.0f32; out_frames * ch];
        for (i, frame) in pcm.chunks_exact_mut(ch).enumerate() {
            let pos = i as f64 * step;
            let i0 = (pos.floor() as usize).min(in_frames - 1);
            let i1 = (i0 + 1).min(in_frames - 1);
            let frac = (pos - i0 as f64) as f32;
            for c in 0..ch {
                let a = self.pcm[i0 * ch + c];
                let b = self.pcm[i1 * ch + c];
                frame[c] = a + (b - a) * frac;
            }
        }
        Self {
            pcm,
            channels: self.channels,
            sample_rate: target_rate,
        }
    }
}
