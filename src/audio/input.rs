//! Microphone audio recording
//!
//! Cross-platform audio input capture using cpal, with automatic mono
//! conversion. Samples accumulate internally until the capture is stopped,
//! so a whole utterance is drained in one piece for the upload.

use crate::error::{ParrotError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    /// Device name
    pub name: String,
    /// Whether this is the default input device
    pub is_default: bool,
}

/// Audio recorder for capturing microphone input
///
/// Opens the default input device and buffers mono f32 samples while a
/// capture is active. Failing to acquire a device is the desktop analogue
/// of a denied microphone permission and is reported as such.
pub struct AudioRecorder {
    stream: Option<Stream>,
    sample_rate: u32,
    channels: u16,
    is_recording: Arc<AtomicBool>,
    samples: Arc<Mutex<Vec<f32>>>,
    device: Device,
    config: StreamConfig,
}

impl AudioRecorder {
    /// Create a new audio recorder with the default input device
    ///
    /// # Errors
    /// Returns an error if no input device is available or configuration fails
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| ParrotError::AudioDeviceError("No input device available".into()))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using input device: {}", device_name);

        let supported_config = device.default_input_config().map_err(|e| {
            ParrotError::AudioDeviceError(format!("Failed to get input config: {}", e))
        })?;

        let config: StreamConfig = supported_config.into();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        info!("Audio config: {}Hz, {} channel(s)", sample_rate, channels);

        Ok(Self {
            stream: None,
            sample_rate,
            channels,
            is_recording: Arc::new(AtomicBool::new(false)),
            samples: Arc::new(Mutex::new(Vec::new())),
            device,
            config,
        })
    }

    /// Start capturing audio
    ///
    /// Interleaved frames are mixed down to mono and appended to the
    /// internal buffer until `stop` is called.
    ///
    /// # Errors
    /// Returns an error if the stream cannot be built or started
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording.load(Ordering::SeqCst) {
            warn!("Already recording, ignoring start request");
            return Ok(());
        }

        let channels = self.channels as usize;
        let sample_rate = self.sample_rate;
        let is_recording = Arc::clone(&self.is_recording);
        let samples = Arc::clone(&self.samples);

        // Sample counter for debug logging
        let sample_count = Arc::new(AtomicUsize::new(0));
        let sample_count_clone = Arc::clone(&sample_count);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        info!(
            "Building audio input stream: {}Hz, {} channel(s)",
            sample_rate, channels
        );

        self.samples.lock().clear();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::SeqCst) {
                        return;
                    }

                    // Convert to mono if necessary
                    let mono: Vec<f32> = if channels == 1 {
                        data.to_vec()
                    } else {
                        // Average all channels to create mono
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    let count = sample_count_clone.fetch_add(mono.len(), Ordering::Relaxed);

                    // Log approximately every second of audio
                    if count % (sample_rate as usize) < mono.len() {
                        debug!(
                            "Audio captured: {} samples ({:.1}s)",
                            count + mono.len(),
                            (count + mono.len()) as f32 / sample_rate as f32
                        );
                    }

                    samples.lock().extend_from_slice(&mono);
                },
                err_fn,
                None,
            )
            .map_err(|e| {
                ParrotError::RecordingError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            ParrotError::RecordingError(format!("Failed to start input stream: {}", e))
        })?;

        self.is_recording.store(true, Ordering::SeqCst);
        self.stream = Some(stream);

        info!("Audio recording started");
        Ok(())
    }

    /// Stop capturing and drain the buffered samples
    ///
    /// # Errors
    /// Returns an error if no capture is active or nothing was captured
    pub fn stop(&mut self) -> Result<Vec<f32>> {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            return Err(ParrotError::CaptureError("No active capture".into()));
        }

        if let Some(stream) = self.stream.take() {
            drop(stream);
        }

        let captured = std::mem::take(&mut *self.samples.lock());
        info!(
            "Audio recording stopped: {} samples ({:.1}s)",
            captured.len(),
            captured.len() as f32 / self.sample_rate as f32
        );

        if captured.is_empty() {
            return Err(ParrotError::CaptureError(
                "Capture produced no audio".into(),
            ));
        }

        Ok(captured)
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Get the sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of input channels
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for AudioRecorder {
    fn drop(&mut self) {
        self.is_recording.store(false, Ordering::SeqCst);
        self.stream.take();
    }
}

/// List available audio input devices
pub fn list_input_devices() -> Vec<AudioDeviceInfo> {
    let host = cpal::default_host();
    let default_device_name = host.default_input_device().and_then(|d| d.name().ok());

    host.input_devices()
        .map(|devices| {
            devices
                .filter_map(|device| {
                    let name = device.name().ok()?;
                    let is_default = default_device_name
                        .as_ref()
                        .map(|d| d == &name)
                        .unwrap_or(false);
                    Some(AudioDeviceInfo { name, is_default })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Should not panic even without audio devices
        let devices = list_input_devices();
        // In CI, might be empty; on dev machines, should have at least one
        println!("Found {} input devices", devices.len());
        for device in &devices {
            println!(
                "  - {} {}",
                device.name,
                if device.is_default { "(default)" } else { "" }
            );
        }
    }

    #[test]
    fn test_audio_recorder_creation() {
        // This test might fail in CI environments without audio devices
        match AudioRecorder::new() {
            Ok(recorder) => {
                assert!(recorder.sample_rate() > 0);
                assert!(recorder.channels() > 0);
                assert!(!recorder.is_recording());
                println!(
                    "Created recorder: {}Hz, {} channels",
                    recorder.sample_rate(),
                    recorder.channels()
                );
            }
            Err(e) => {
                println!("Could not create recorder (expected in CI): {}", e);
            }
        }
    }

    #[test]
    fn test_stop_without_capture_is_an_error() {
        if let Ok(mut recorder) = AudioRecorder::new() {
            let err = recorder.stop().unwrap_err();
            assert!(matches!(err, ParrotError::CaptureError(_)));
        }
    }

    #[test]
    fn test_double_start() {
        if let Ok(mut recorder) = AudioRecorder::new() {
            if recorder.start().is_ok() {
                // Second start is a no-op at this level; the orchestrator
                // rejects it before it gets here
                assert!(recorder.start().is_ok());
                assert!(recorder.is_recording());
                let _ = recorder.stop();
            }
        }
    }

    #[test]
    fn test_recording_state_follows_start_stop() {
        if let Ok(mut recorder) = AudioRecorder::new() {
            assert!(!recorder.is_recording());

            if recorder.start().is_ok() {
                assert!(recorder.is_recording());

                std::thread::sleep(std::time::Duration::from_millis(200));
                match recorder.stop() {
                    Ok(samples) => {
                        assert!(!samples.is_empty());
                        println!("Captured {} samples", samples.len());
                    }
                    Err(e) => {
                        // A silent device can deliver nothing in CI
                        println!("Stop returned error (tolerated in CI): {}", e);
                    }
                }
                assert!(!recorder.is_recording());
            }
        }
    }
}
