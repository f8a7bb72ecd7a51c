//! Stacking same-shaped signals along a leading batch axis.

use crate::{AudioSignal, SignalError, SignalResult};

/// A batch of same-shaped signals stacked along a new leading axis.
///
/// The stacked PCM is contiguous (`item * frames * channels`), while sample
/// rate and duration stay observable per item: the dataset may retarget its
/// sample rate mid-run, so two items of identical shape can carry different
/// rates.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalBatch {
    pcm: Vec<f32>,
    frames: usize,
    channels: u16,
    sample_rates: Vec<u32>,
}

impl SignalBatch {
    /// Stack signals in order. All items must share frame and channel count.
    pub fn stack(items: Vec<AudioSignal>) -> SignalResult<Self> {
        let first = items.first().ok_or(SignalError::EmptyBatch)?;
        let frames = first.frames();
        let channels = first.channels;

        let mut pcm = Vec::with_capacity(items.len() * frames * channels as usize);
        let mut sample_rates = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if item.frames() != frames || item.channels != channels {
                return Err(SignalError::ShapeMismatch {
                    index,
                    expected_frames: frames,
                    expected_channels: channels,
                    frames: item.frames(),
                    channels: item.channels,
                });
            }
            pcm.extend_from_slice(&item.pcm);
            sample_rates.push(item.sample_rate);
        }
        Ok(Self {
            pcm,
            frames,
            channels,
            sample_rates,
        })
    }

    pub fn len(&self) -> usize {
        self.sample_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_rates.is_empty()
    }

    /// Frames per item.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Per-item sample rates, batch order.
    pub fn sample_rates(&self) -> &[u32] {
        &self.sample_rates
    }

    /// Per-item durations in seconds, batch order.
    pub fn durations(&self) -> Vec<f64> {
        self.sample_rates
            .iter()
            .map(|&sr| self.frames as f64 / f64::from(sr))
            .collect()
    }

    /// PCM slice of the i-th item.
    pub fn item_pcm(&self, index: usize) -> SignalResult<&[f32]> {
        let stride = self.frames * self.channels as usize;
        if index >= self.len() {
            return Err(SignalError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(&self.pcm[index * stride..(index + 1) * stride])
    }

    /// Recover the i-th item as an owned signal.
    pub fn item(&self, index: usize) -> SignalResult<AudioSignal> {
        let pcm = self.item_pcm(index)?.to_vec();
        AudioSignal::new(pcm, self.channels, self.sample_rates[index])
    }

    /// Overwrite the i-th item. The replacement must match the batch shape.
    pub fn set_item(&mut self, index: usize, signal: &AudioSignal) -> SignalResult<()> {
        if index >= self.len() {
            return Err(SignalError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        if signal.frames() != self.frames || signal.channels != self.channels {
            return Err(SignalError::ShapeMismatch {
                index,
                expected_frames: self.frames,
                expected_channels: self.channels,
                frames: signal.frames(),
                channels: signal.channels,
            });
        }
        let stride = self.frames * self.channels as usize;
        self.pcm[index * stride..(index + 1) * stride].copy_from_slice(&signal.pcm);
        self.sample_rates[index] = signal.sample_rate;
        Ok(())
    }
}
