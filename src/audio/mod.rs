//! Audio capture and WAV handling
//!
//! This module owns the microphone side of an exchange: capturing mono
//! samples from the default input device and persisting them as the WAV
//! file the uploader ships to the backend.

pub mod input;
pub mod wav;

pub use input::{list_input_devices, AudioDeviceInfo, AudioRecorder};
pub use wav::{capture_path, read_wav, write_wav};
