//! Orchestrator for one voice exchange at a time
//!
//! Coordinates the recorder, the upload worker, and the speech worker from
//! a single thread. All phase transitions happen here, guarded against
//! illegal moves: a start while busy or a stop while idle is rejected with
//! an alert, never silently ignored or overwritten.
//!
//! The shared `AppState` is queried by the UI for rendering; events on the
//! handle only signal that a repaint is worthwhile.

use crate::audio::{capture_path, write_wav, AudioRecorder};
use crate::config::AppConfig;
use crate::net::{UploadEvent, Uploader, UploaderConfig};
use crate::speech::{Speaker, SpeechCommand, SpeechConfig, SpeechEvent};
use crate::state::{AppCommand, AppEvent, SharedAppState};
use crate::{ParrotError, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Backend endpoint receiving the capture
    pub endpoint: String,
    /// Speech engine configuration
    pub speech: SpeechConfig,
    /// Channel buffer size
    pub channel_buffer_size: usize,
    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        Self {
            endpoint: app.endpoint,
            speech: SpeechConfig::default(),
            channel_buffer_size: 16,
            shutdown_timeout_ms: 5000,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the speech configuration
    pub fn with_speech(mut self, speech: SpeechConfig) -> Self {
        self.speech = speech;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout_ms(mut self, timeout: u64) -> Self {
        self.shutdown_timeout_ms = timeout;
        self
    }
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new()
            .with_endpoint(config.endpoint.clone())
            .with_speech(
                SpeechConfig::new(config.language.clone()).with_rate_factor(config.speech_rate),
            )
    }
}

/// Handle for controlling the orchestrator from the UI or tests
pub struct OrchestratorHandle {
    command_tx: Sender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    state: SharedAppState,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| ParrotError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Start recording
    pub fn start_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StartRecording)
    }

    /// Stop recording and upload the capture
    pub fn stop_recording(&self) -> Result<()> {
        self.send_command(AppCommand::StopRecording)
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a clone of the event receiver
    ///
    /// Each event is delivered to exactly one receiver, so a dedicated
    /// consumer thread should be the only one draining the channel.
    pub fn event_receiver(&self) -> Receiver<AppEvent> {
        self.event_rx.clone()
    }

    /// Receive an event (blocking)
    pub fn recv_event(&self) -> Result<AppEvent> {
        self.event_rx
            .recv()
            .map_err(|e| ParrotError::ChannelError(format!("Failed to receive event: {}", e)))
    }

    /// Get the shared application state
    pub fn state(&self) -> &SharedAppState {
        &self.state
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Check if an upload is in flight
    pub fn is_uploading(&self) -> bool {
        self.state.is_uploading()
    }

    /// Check if an exchange is in flight
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }
}

/// Main orchestrator coordinating the recorder and the workers
///
/// Owns the command loop; the recorder lives inside the loop thread because
/// its capture stream must not cross threads.
pub struct Orchestrator {
    config: OrchestratorConfig,
    state: SharedAppState,
    command_rx: Receiver<AppCommand>,
    event_tx: Sender<AppEvent>,
}

impl Orchestrator {
    /// Create a new orchestrator with the given configuration
    ///
    /// Returns the orchestrator and a handle for controlling it. The
    /// orchestrator must be started with `start()` to begin processing.
    pub fn new(config: OrchestratorConfig) -> Result<(Self, OrchestratorHandle)> {
        Self::with_state(config, SharedAppState::new())
    }

    /// Create an orchestrator with an existing shared state
    ///
    /// Useful when other components (tests, the UI) were created before the
    /// orchestrator and already hold the state.
    pub fn with_state(
        config: OrchestratorConfig,
        state: SharedAppState,
    ) -> Result<(Self, OrchestratorHandle)> {
        let buffer_size = config.channel_buffer_size;

        let (command_tx, command_rx) = bounded(buffer_size);
        let (event_tx, event_rx) = bounded(buffer_size);

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            state: state.clone(),
        };

        let orchestrator = Self {
            config,
            state,
            command_rx,
            event_tx,
        };

        Ok((orchestrator, handle))
    }

    /// Start the orchestrator and its workers
    ///
    /// Consumes the orchestrator and returns join handles for all worker
    /// threads.
    pub fn start(self) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        let uploader = Uploader::new(
            UploaderConfig::new(self.config.endpoint.clone())
                .with_channel_buffer_size(self.config.channel_buffer_size),
        );
        let upload_handle = uploader.start_worker()?;
        info!("Upload worker started");

        let speaker = Speaker::new(self.config.speech.clone());
        let speech_handle = speaker.start_worker()?;
        info!("Speech worker started");

        let loop_handle = self.run_loop(upload_handle, speech_handle);
        handles.push(loop_handle);
        info!("Orchestrator loop started");

        Ok(handles)
    }

    /// Run the main event loop on its own thread
    fn run_loop(
        self,
        upload_handle: crate::net::UploadHandle,
        speech_handle: crate::speech::SpeechHandle,
    ) -> JoinHandle<()> {
        let state = self.state;
        let command_rx = self.command_rx;
        let event_tx = self.event_tx;
        let shutdown_timeout = Duration::from_millis(self.config.shutdown_timeout_ms);

        let upload_event_rx = upload_handle.event_receiver();
        let upload_command_tx = upload_handle.command_sender();
        let speech_event_rx = speech_handle.event_receiver();
        let speech_command_tx = speech_handle.command_sender();

        thread::spawn(move || {
            info!("Orchestrator main loop starting");

            // The cpal stream is not Send, so the recorder is created and
            // dropped entirely inside this thread. Acquisition is retried on
            // every start so a device plugged in later still works.
            let mut recorder: Option<AudioRecorder> = None;

            loop {
                select! {
                    recv(command_rx) -> cmd => {
                        match cmd {
                            Ok(AppCommand::StartRecording) => {
                                if !state.read().phase.can_record() {
                                    let e = ParrotError::RecordingError(format!(
                                        "cannot start recording in phase {}",
                                        state.read().phase
                                    ));
                                    warn!("Rejected start: {}", e);
                                    state.write().set_alert(&e);
                                    let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                    continue;
                                }

                                // Device acquisition happens before any
                                // transition so a denied microphone leaves
                                // the phase untouched
                                if recorder.is_none() {
                                    match AudioRecorder::new() {
                                        Ok(r) => recorder = Some(r),
                                        Err(e) => {
                                            error!("No usable input device: {}", e);
                                            state.write().set_alert(&e);
                                            let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                            continue;
                                        }
                                    }
                                }

                                // The transition result is bound before the
                                // alert takes the lock again; matching on
                                // the call directly would hold the write
                                // guard through the branch
                                let begun = state.write().begin_recording();
                                if let Err(e) = begun {
                                    warn!("Rejected start: {}", e);
                                    state.write().set_alert(&e);
                                    let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                    continue;
                                }

                                match recorder.as_mut().map(|r| r.start()) {
                                    Some(Ok(())) => {
                                        debug!("Recording started");
                                        let _ = event_tx.send(AppEvent::StateChanged);
                                    }
                                    Some(Err(e)) => {
                                        error!("Failed to start capture: {}", e);
                                        // A stream that failed to build is not
                                        // worth keeping around
                                        recorder = None;
                                        state.write().abort_recording(&e);
                                        let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                    }
                                    None => unreachable!("recorder acquired above"),
                                }
                            }

                            Ok(AppCommand::StopRecording) => {
                                if !state.read().phase.is_recording() {
                                    let e = ParrotError::CaptureError(
                                        "no active recording to stop".into(),
                                    );
                                    warn!("Rejected stop: {}", e);
                                    state.write().set_alert(&e);
                                    let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                    continue;
                                }

                                let stopped = match recorder.as_mut() {
                                    Some(r) => r.stop(),
                                    None => Err(ParrotError::CaptureError(
                                        "no recorder available".into(),
                                    )),
                                };

                                match stopped.and_then(|samples| {
                                    let rate = recorder
                                        .as_ref()
                                        .map(|r| r.sample_rate())
                                        .unwrap_or(44_100);
                                    let path = capture_path();
                                    write_wav(&path, &samples, rate, 1)?;
                                    Ok(path)
                                }) {
                                    Ok(path) => {
                                        // Bound first for the same locking
                                        // reason as the start transition
                                        let entered = state.write().begin_upload(path.clone());
                                        if let Err(e) = entered {
                                            error!("Failed to enter upload phase: {}", e);
                                            state.write().fail_exchange(&e);
                                            let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                            continue;
                                        }
                                        if let Err(e) = upload_handle.upload(path) {
                                            error!("Failed to dispatch upload: {}", e);
                                            state.write().fail_exchange(&e);
                                            let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                        } else {
                                            debug!("Capture handed to uploader");
                                            let _ = event_tx.send(AppEvent::StateChanged);
                                        }
                                    }
                                    Err(e) => {
                                        error!("Failed to finalize capture: {}", e);
                                        state.write().fail_exchange(&e);
                                        let _ = event_tx.send(AppEvent::Error(e.to_string()));
                                    }
                                }
                            }

                            Ok(AppCommand::Shutdown) => {
                                info!("Shutdown requested");

                                if let Some(r) = recorder.as_mut() {
                                    if r.is_recording() {
                                        let _ = r.stop();
                                    }
                                }
                                drop(recorder);

                                let _ = upload_command_tx
                                    .send(crate::net::UploadCommand::Shutdown);
                                let _ = speech_command_tx.send(SpeechCommand::Shutdown);

                                let mut upload_down = false;
                                let mut speech_down = false;
                                let deadline = std::time::Instant::now() + shutdown_timeout;

                                while !(upload_down && speech_down) {
                                    if std::time::Instant::now() > deadline {
                                        warn!("Shutdown timeout reached, forcing exit");
                                        break;
                                    }

                                    if let Ok(event) =
                                        upload_event_rx.recv_timeout(Duration::from_millis(100))
                                    {
                                        if matches!(event, UploadEvent::Shutdown) {
                                            upload_down = true;
                                            debug!("Upload worker shutdown confirmed");
                                        }
                                    }

                                    if let Ok(event) =
                                        speech_event_rx.recv_timeout(Duration::from_millis(10))
                                    {
                                        if matches!(event, SpeechEvent::Shutdown) {
                                            speech_down = true;
                                            debug!("Speech worker shutdown confirmed");
                                        }
                                    }
                                }

                                let _ = event_tx.send(AppEvent::Shutdown);
                                info!("Orchestrator shutdown complete");
                                return;
                            }

                            Err(_) => {
                                warn!("Command channel disconnected");
                                return;
                            }
                        }
                    }

                    recv(upload_event_rx) -> event => {
                        match event {
                            Ok(event) => handle_upload_event(
                                &state,
                                &event_tx,
                                &speech_command_tx,
                                event,
                            ),
                            Err(_) => {
                                warn!("Upload event channel disconnected");
                            }
                        }
                    }

                    recv(speech_event_rx) -> event => {
                        match event {
                            Ok(event) => handle_speech_event(&state, &event_tx, event),
                            Err(_) => {
                                warn!("Speech event channel disconnected");
                            }
                        }
                    }

                    default(Duration::from_millis(10)) => {}
                }
            }
        })
    }
}

/// Apply one upload worker event to the shared state
///
/// Factored out of the loop so the exchange transitions can be driven
/// directly in tests.
fn handle_upload_event(
    state: &SharedAppState,
    event_tx: &Sender<AppEvent>,
    speech_command_tx: &Sender<SpeechCommand>,
    event: UploadEvent,
) {
    match event {
        UploadEvent::Started => {
            debug!("Upload in flight");
        }

        UploadEvent::Complete(reply) => {
            info!("Exchange complete");
            let response = reply.response.clone();
            state
                .write()
                .complete_exchange(reply.transcription, reply.response);
            let _ = event_tx.send(AppEvent::StateChanged);

            if let Some(text) = response {
                if let Err(e) = speech_command_tx.send(SpeechCommand::Speak(text)) {
                    error!("Failed to dispatch utterance: {}", e);
                }
            }
        }

        UploadEvent::Error(e) => {
            error!("Upload failed: {}", e);
            state.write().fail_exchange(&e);
            let _ = event_tx.send(AppEvent::Error(e.to_string()));
        }

        UploadEvent::Shutdown => {
            debug!("Upload worker shutdown event received");
        }
    }
}

/// Apply one speech worker event to the shared state
fn handle_speech_event(state: &SharedAppState, event_tx: &Sender<AppEvent>, event: SpeechEvent) {
    match event {
        SpeechEvent::Started => {
            debug!("Utterance handed to the platform engine");
        }

        SpeechEvent::Error(e) => {
            // The response stays on screen; only the alert is raised
            warn!("Speech failed: {}", e);
            state.write().set_alert(&e);
            let _ = event_tx.send(AppEvent::Error(e.to_string()));
        }

        SpeechEvent::Shutdown => {
            debug!("Speech worker shutdown event received");
        }
    }
}
