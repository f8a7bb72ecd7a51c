//! WAV file IO via hound, normalized to f32.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{AudioSignal, SignalError, SignalResult};

/// Read a WAV file into an [`AudioSignal`].
///
/// Integer formats are normalized to [-1, 1]; float files are taken as-is.
pub fn read_wav<P: AsRef<Path>>(path: P) -> SignalResult<AudioSignal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let pcm: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    AudioSignal::new(pcm, spec.channels, spec.sample_rate)
}

/// Probe a WAV header without reading samples.
///
/// Returns `(frames, channels, sample_rate)`.
pub fn wav_spec<P: AsRef<Path>>(path: P) -> SignalResult<(usize, u16, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(SignalError::InvalidSpec("wav header: 0 channels".into()));
    }
    let frames = reader.duration() as usize;
    Ok((frames, spec.channels, spec.sample_rate))
}

/// Write a signal as a 32-bit float WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, signal: &AudioSignal) -> SignalResult<()> {
    let spec = WavSpec {
        channels: signal.channels,
        sample_rate: signal.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in &signal.pcm {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let pcm: Vec<f32> = (0..800)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        let signal = AudioSignal::new(pcm, 1, 8000).unwrap();

        write_wav(&path, &signal).unwrap();
        let loaded = read_wav(&path).unwrap();

        assert_eq!(loaded.sample_rate, 8000);
        assert_eq!(loaded.channels, 1);
        assert!(loaded.allclose(&signal, 1e-7));

        let (frames, channels, sample_rate) = wav_spec(&path).unwrap();
        assert_eq!((frames, channels, sample_rate), (800, 1, 8000));
    }

    #[test]
    fn read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_wav(dir.path().join("absent.wav")).is_err());
    }
}
