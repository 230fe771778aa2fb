//! Text-to-speech via the platform speech engine
//!
//! Wraps the OS speech facility (speech-dispatcher, SAPI, AVFoundation)
//! behind a worker thread. Utterances are fire-and-forget: a synthesis
//! failure raises an alert but never rolls back what is already on screen.

use crate::{ParrotError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use tts::Tts;

/// Configuration for the speech engine
#[derive(Clone, Debug)]
pub struct SpeechConfig {
    /// BCP 47 tag selecting the voice
    pub language: String,
    /// Rate factor, 1.0 being the voice's normal rate
    pub rate_factor: f32,
    /// Channel buffer size
    pub channel_buffer_size: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "fr-FR".to_string(),
            rate_factor: 0.5,
            channel_buffer_size: 16,
        }
    }
}

impl SpeechConfig {
    /// Create a configuration for the given language
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Set the rate factor
    pub fn with_rate_factor(mut self, factor: f32) -> Self {
        self.rate_factor = factor;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

/// Commands sent to the speech worker
#[derive(Clone, Debug)]
pub enum SpeechCommand {
    /// Speak the given text, interrupting any in-flight utterance
    Speak(String),
    /// Stop the current utterance
    Stop,
    /// Shutdown the worker
    Shutdown,
}

/// Events emitted by the speech worker
#[derive(Clone, Debug)]
pub enum SpeechEvent {
    /// An utterance was handed to the platform engine
    Started,
    /// Synthesis failed
    Error(ParrotError),
    /// Worker shut down
    Shutdown,
}

/// Map a rate factor onto the platform engine's numeric range
///
/// Platform engines disagree on what the rate number means, so the factor
/// is interpreted against the voice's own range: 1.0 is the normal rate,
/// values below scale linearly down to the minimum, values above linearly
/// up to the maximum.
fn scaled_rate(min: f32, normal: f32, max: f32, factor: f32) -> f32 {
    let factor = factor.max(0.0);
    if factor >= 1.0 {
        let span = max - normal;
        (normal + (factor - 1.0) * span).min(max)
    } else {
        min + factor * (normal - min)
    }
}

/// Speech engine wrapping the platform TTS facility
pub struct SpeechEngine {
    tts: Tts,
    config: SpeechConfig,
}

impl SpeechEngine {
    /// Create a new engine, selecting a voice and rate from the config
    ///
    /// Voice and rate selection are best-effort: not every platform engine
    /// supports them, and a missing voice for the configured language falls
    /// back to the engine default.
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let mut tts = Tts::default()
            .map_err(|e| ParrotError::SpeechError(format!("Failed to initialize TTS: {}", e)))?;

        let features = tts.supported_features();

        if features.voice {
            match tts.voices() {
                Ok(voices) => {
                    let wanted = config.language.to_lowercase();
                    let primary = wanted.split('-').next().unwrap_or(&wanted).to_string();
                    let voice = voices
                        .iter()
                        .find(|v| v.language().to_string().to_lowercase() == wanted)
                        .or_else(|| {
                            voices.iter().find(|v| {
                                v.language()
                                    .to_string()
                                    .to_lowercase()
                                    .starts_with(&primary)
                            })
                        });

                    match voice {
                        Some(voice) => {
                            info!("Selected voice {:?} for {}", voice.name(), config.language);
                            if let Err(e) = tts.set_voice(voice) {
                                warn!("Failed to set voice: {}", e);
                            }
                        }
                        None => {
                            warn!(
                                "No voice for {}, using the engine default",
                                config.language
                            );
                        }
                    }
                }
                Err(e) => warn!("Failed to list voices: {}", e),
            }
        }

        if features.rate {
            let rate = scaled_rate(
                tts.min_rate(),
                tts.normal_rate(),
                tts.max_rate(),
                config.rate_factor,
            );
            debug!("Setting speech rate {} (factor {})", rate, config.rate_factor);
            if let Err(e) = tts.set_rate(rate) {
                warn!("Failed to set speech rate: {}", e);
            }
        }

        Ok(Self { tts, config })
    }

    /// Speak the given text, interrupting any in-flight utterance
    ///
    /// Empty text is skipped silently.
    pub fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            debug!("Skipping empty utterance");
            return Ok(());
        }

        debug!("Speaking {} chars in {}", text.len(), self.config.language);
        self.tts
            .speak(text, true)
            .map_err(|e| ParrotError::SpeechError(format!("Synthesis failed: {}", e)))?;
        Ok(())
    }

    /// Stop the current utterance
    pub fn stop(&mut self) -> Result<()> {
        self.tts
            .stop()
            .map_err(|e| ParrotError::SpeechError(format!("Failed to stop speech: {}", e)))?;
        Ok(())
    }
}

/// Handle for interacting with a running speech worker
pub struct SpeechHandle {
    command_tx: Sender<SpeechCommand>,
    event_rx: Receiver<SpeechEvent>,
    worker_handle: Option<JoinHandle<()>>,
}

impl SpeechHandle {
    /// Request an utterance
    pub fn speak(&self, text: impl Into<String>) -> Result<()> {
        self.command_tx
            .send(SpeechCommand::Speak(text.into()))
            .map_err(|e| ParrotError::ChannelError(format!("Failed to send speak command: {}", e)))
    }

    /// Stop the current utterance
    pub fn stop(&self) -> Result<()> {
        self.command_tx
            .send(SpeechCommand::Stop)
            .map_err(|e| ParrotError::ChannelError(format!("Failed to send stop command: {}", e)))
    }

    /// Get a receiver for worker events
    pub fn event_receiver(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }

    /// Try to receive an event without blocking
    pub fn try_recv_event(&self) -> Option<SpeechEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a sender for commands (used by the orchestrator's shutdown path)
    pub fn command_sender(&self) -> Sender<SpeechCommand> {
        self.command_tx.clone()
    }

    /// Shutdown the worker and join its thread
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.command_tx.send(SpeechCommand::Shutdown);
        if let Some(handle) = self.worker_handle.take() {
            handle
                .join()
                .map_err(|_| ParrotError::ChannelError("Speech worker thread panicked".into()))?;
        }
        Ok(())
    }
}

/// Speaker that spawns a worker thread owning the platform engine
///
/// The engine is created inside the worker so a slow or broken synthesizer
/// never stalls the orchestrator or the UI.
pub struct Speaker {
    config: SpeechConfig,
}

impl Speaker {
    /// Create a new speaker with the given configuration
    pub fn new(config: SpeechConfig) -> Self {
        Self { config }
    }

    /// Start the speech worker thread
    pub fn start_worker(self) -> Result<SpeechHandle> {
        let (command_tx, command_rx) = bounded::<SpeechCommand>(self.config.channel_buffer_size);
        let (event_tx, event_rx) = bounded::<SpeechEvent>(self.config.channel_buffer_size);

        let config = self.config;

        let worker_handle = std::thread::spawn(move || {
            info!("Speech worker starting, language: {}", config.language);

            let mut engine = match SpeechEngine::new(config) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    // Keep running: utterance requests still produce an
                    // alert instead of silently vanishing
                    error!("Failed to initialize speech engine: {}", e);
                    let _ = event_tx.send(SpeechEvent::Error(e));
                    None
                }
            };

            loop {
                match command_rx.recv() {
                    Ok(SpeechCommand::Speak(text)) => match engine.as_mut() {
                        Some(engine) => match engine.speak(&text) {
                            Ok(()) => {
                                let _ = event_tx.send(SpeechEvent::Started);
                            }
                            Err(e) => {
                                warn!("Synthesis failed: {}", e);
                                let _ = event_tx.send(SpeechEvent::Error(e));
                            }
                        },
                        None => {
                            let _ = event_tx.send(SpeechEvent::Error(ParrotError::SpeechError(
                                "Speech engine unavailable".into(),
                            )));
                        }
                    },

                    Ok(SpeechCommand::Stop) => {
                        if let Some(engine) = engine.as_mut() {
                            if let Err(e) = engine.stop() {
                                warn!("Failed to stop utterance: {}", e);
                            }
                        }
                    }

                    Ok(SpeechCommand::Shutdown) => {
                        info!("Speech worker shutting down");
                        if let Some(engine) = engine.as_mut() {
                            let _ = engine.stop();
                        }
                        break;
                    }

                    Err(_) => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            let _ = event_tx.send(SpeechEvent::Shutdown);
            info!("Speech worker stopped");
        });

        Ok(SpeechHandle {
            command_tx,
            event_rx,
            worker_handle: Some(worker_handle),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_config_default() {
        let config = SpeechConfig::default();
        assert_eq!(config.language, "fr-FR");
        assert_eq!(config.rate_factor, 0.5);
    }

    #[test]
    fn test_speech_config_builder() {
        let config = SpeechConfig::new("en-US")
            .with_rate_factor(1.5)
            .with_channel_buffer_size(8);
        assert_eq!(config.language, "en-US");
        assert_eq!(config.rate_factor, 1.5);
        assert_eq!(config.channel_buffer_size, 8);
    }

    #[test]
    fn test_scaled_rate_normal() {
        assert_eq!(scaled_rate(0.0, 1.0, 2.0, 1.0), 1.0);
    }

    #[test]
    fn test_scaled_rate_half_is_between_min_and_normal() {
        // speech-dispatcher style range
        let rate = scaled_rate(-100.0, 0.0, 100.0, 0.5);
        assert_eq!(rate, -50.0);
    }

    #[test]
    fn test_scaled_rate_above_normal() {
        let rate = scaled_rate(0.5, 1.0, 3.0, 1.5);
        assert_eq!(rate, 2.0);
    }

    #[test]
    fn test_scaled_rate_clamps_to_range() {
        assert_eq!(scaled_rate(0.0, 1.0, 2.0, 10.0), 2.0);
        assert_eq!(scaled_rate(0.0, 1.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn test_worker_starts_without_panicking() {
        // A headless machine has no speech engine; the worker must still
        // start, report the failure, and shut down cleanly
        let speaker = Speaker::new(SpeechConfig::default());
        let handle = speaker.start_worker().unwrap();
        handle.shutdown().unwrap();
    }
}
