//! WAV file helpers for the upload artifact
//!
//! The backend accepts `.wav` untouched and converts everything else, so the
//! capture is shipped as mono 16-bit PCM at the device sample rate.

use crate::{ParrotError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Location of the current capture file
///
/// A single file: at most one recording session exists at a time, and a new
/// capture overwrites the previous one.
pub fn capture_path() -> PathBuf {
    std::env::temp_dir().join("parrot-capture.wav")
}

/// Write audio samples to a WAV file
///
/// # Arguments
/// * `path` - Path to the output WAV file
/// * `samples` - Audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path.as_ref(), spec)
        .map_err(|e| ParrotError::CaptureError(format!("Failed to create WAV writer: {}", e)))?;

    // Convert f32 samples to i16
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| ParrotError::CaptureError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| ParrotError::CaptureError(format!("Failed to finalize WAV file: {}", e)))?;

    info!(
        "Wrote {} samples to WAV file: {:?}",
        samples.len(),
        path.as_ref()
    );
    Ok(())
}

/// Read audio samples from a WAV file
///
/// Understands the formats this application writes (16-bit PCM) plus f32,
/// which is enough to inspect its own capture artifacts.
///
/// # Returns
/// * Tuple of (samples, sample_rate, channels)
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| ParrotError::IOError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels;

    debug!(
        "Reading WAV file: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples: Result<Vec<f32>> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| ParrotError::IOError(format!("Failed to read sample: {}", e))))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| {
                s.map(|sample| sample as f32 / i16::MAX as f32)
                    .map_err(|e| ParrotError::IOError(format!("Failed to read sample: {}", e)))
            })
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(ParrotError::IOError(format!(
                "Unsupported bit depth: {}",
                bits
            )));
        }
    };

    let samples = samples?;
    debug!("Read {} samples from WAV file", samples.len());

    Ok((samples, sample_rate, channels))
}
