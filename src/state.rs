//! Application state for the Parrot voice client
//!
//! This module provides a thread-safe shared state that can be accessed by:
//! - **Orchestrator**: Writes state changes based on worker events
//! - **UI**: Reads state for rendering, sends commands
//!
//! The exchange lifecycle is a single explicit enum rather than a set of
//! optional fields: every screen the application can show corresponds to
//! exactly one `Phase` variant, and rendering matches on it exhaustively.

use crate::{ParrotError, Result};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

/// Lifecycle of one voice exchange
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing in flight, ready to record
    #[default]
    Idle,
    /// Microphone capture in progress
    Recording,
    /// Capture finished, upload to the backend in flight
    Uploading,
    /// Exchange finished; the backend may legitimately answer with
    /// transcription only (empty action list), hence the optional response
    Done {
        transcription: String,
        response: Option<String>,
    },
    /// Exchange aborted; `reason` is the internal error description
    Failed { reason: String },
}

impl Phase {
    /// Check if ready for a new recording
    ///
    /// A finished or failed exchange can be recorded over; an active one
    /// cannot.
    pub fn can_record(&self) -> bool {
        !self.is_busy()
    }

    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, Phase::Recording)
    }

    /// Check if an upload is in flight
    pub fn is_uploading(&self) -> bool {
        matches!(self, Phase::Uploading)
    }

    /// Check if idle
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    /// Check if the last exchange completed
    pub fn is_done(&self) -> bool {
        matches!(self, Phase::Done { .. })
    }

    /// Check if the last exchange failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Phase::Failed { .. })
    }

    /// Check if an exchange is in flight (recording or uploading)
    pub fn is_busy(&self) -> bool {
        self.is_recording() || self.is_uploading()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Recording => write!(f, "Recording"),
            Phase::Uploading => write!(f, "Uploading"),
            Phase::Done { .. } => write!(f, "Done"),
            Phase::Failed { .. } => write!(f, "Failed"),
        }
    }
}

/// Application state
///
/// Single source of truth, shared across threads via `SharedAppState`.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    /// Current exchange phase
    pub phase: Phase,
    /// Pending user-facing alert (French), shown until dismissed or until a
    /// new recording starts
    pub alert: Option<String>,
    /// Location of the last finalized capture, kept while it is being
    /// uploaded and afterwards so the UI can show the captured notice
    pub captured_audio: Option<PathBuf>,
}

impl AppState {
    /// Create a new default state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            phase: self.phase.clone(),
            alert: self.alert.clone(),
            captured_audio: self.captured_audio.clone(),
        }
    }

    /// Raise a user-facing alert without changing phase
    pub fn set_alert(&mut self, err: &ParrotError) {
        self.alert = Some(err.user_message());
    }

    /// Dismiss the current alert
    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    // === Phase transitions ===
    //
    // Guarded transitions return an error and leave the state untouched when
    // the move is illegal; the caller decides how loudly to reject it.

    /// Begin a new recording
    ///
    /// Rejected while a recording or upload is in flight. On success the
    /// previous exchange (texts, capture marker, alert) is cleared.
    pub fn begin_recording(&mut self) -> Result<()> {
        if !self.phase.can_record() {
            return Err(ParrotError::RecordingError(format!(
                "cannot start recording in phase {}",
                self.phase
            )));
        }
        self.phase = Phase::Recording;
        self.captured_audio = None;
        self.alert = None;
        Ok(())
    }

    /// Finish the capture and move to uploading
    ///
    /// Rejected unless a recording is active.
    pub fn begin_upload(&mut self, capture: PathBuf) -> Result<()> {
        if !self.phase.is_recording() {
            return Err(ParrotError::CaptureError(format!(
                "no active recording to stop in phase {}",
                self.phase
            )));
        }
        self.captured_audio = Some(capture);
        self.phase = Phase::Uploading;
        Ok(())
    }

    /// Record a completed exchange
    pub fn complete_exchange(&mut self, transcription: String, response: Option<String>) {
        self.phase = Phase::Done {
            transcription,
            response,
        };
    }

    /// Record a failed exchange and raise its alert
    pub fn fail_exchange(&mut self, err: &ParrotError) {
        self.alert = Some(err.user_message());
        self.phase = Phase::Failed {
            reason: err.to_string(),
        };
    }

    /// Abort a recording that never produced a capture (start failure)
    ///
    /// Unlike `fail_exchange` this returns to `Idle`: nothing was in flight
    /// worth keeping on screen, matching the behaviour of a denied
    /// permission.
    pub fn abort_recording(&mut self, err: &ParrotError) {
        self.alert = Some(err.user_message());
        self.phase = Phase::Idle;
    }
}

/// Immutable snapshot of application state
///
/// Used for rendering and assertions without holding the lock.
#[derive(Clone, Debug)]
pub struct AppStateSnapshot {
    pub phase: Phase,
    pub alert: Option<String>,
    pub captured_audio: Option<PathBuf>,
}

impl AppStateSnapshot {
    /// Transcription of the last completed exchange, if any
    pub fn transcription(&self) -> Option<&str> {
        match &self.phase {
            Phase::Done { transcription, .. } => Some(transcription.as_str()),
            _ => None,
        }
    }

    /// Response text of the last completed exchange, if any
    pub fn response(&self) -> Option<&str> {
        match &self.phase {
            Phase::Done { response, .. } => response.as_deref(),
            _ => None,
        }
    }
}

/// Thread-safe shared application state
///
/// Wraps `AppState` in `Arc<RwLock<>>` for concurrent access.
#[derive(Clone)]
pub struct SharedAppState {
    inner: Arc<RwLock<AppState>>,
}

impl Default for SharedAppState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedAppState {
    /// Create a new shared state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppState::new())),
        }
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.inner.read()
    }

    /// Get a write lock on the state
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, AppState> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> AppStateSnapshot {
        self.inner.read().snapshot()
    }

    // === Convenience read methods ===

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.inner.read().phase.is_recording()
    }

    /// Check if an upload is in flight
    pub fn is_uploading(&self) -> bool {
        self.inner.read().phase.is_uploading()
    }

    /// Check if an exchange is in flight
    pub fn is_busy(&self) -> bool {
        self.inner.read().phase.is_busy()
    }

    /// Get the current phase
    pub fn phase(&self) -> Phase {
        self.inner.read().phase.clone()
    }

    /// Get the pending alert, if any
    pub fn alert(&self) -> Option<String> {
        self.inner.read().alert.clone()
    }
}

/// Commands sent by the UI to the orchestrator
#[derive(Clone, Debug)]
pub enum AppCommand {
    /// Start recording audio
    StartRecording,
    /// Stop recording and upload the capture
    StopRecording,
    /// Shutdown all workers
    Shutdown,
}

/// Events emitted by the orchestrator
///
/// Used for UI repaints and logging. State should be queried directly from
/// `SharedAppState` rather than reconstructed from events.
#[derive(Clone, Debug)]
pub enum AppEvent {
    /// State has changed (trigger UI repaint)
    StateChanged,
    /// Error occurred (already reflected in the state's alert)
    Error(String),
    /// Shutdown complete
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_flags() {
        assert!(Phase::Idle.is_idle());
        assert!(Phase::Idle.can_record());
        assert!(Phase::Recording.is_recording());
        assert!(Phase::Recording.is_busy());
        assert!(Phase::Uploading.is_uploading());
        assert!(Phase::Uploading.is_busy());
        assert!(!Phase::Uploading.can_record());

        let done = Phase::Done {
            transcription: "bonjour".to_string(),
            response: Some("salut".to_string()),
        };
        assert!(done.is_done());
        assert!(done.can_record());

        let failed = Phase::Failed {
            reason: "boom".to_string(),
        };
        assert!(failed.is_failed());
        assert!(failed.can_record());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "Idle");
        assert_eq!(Phase::Recording.to_string(), "Recording");
        assert_eq!(Phase::Uploading.to_string(), "Uploading");
    }

    #[test]
    fn test_full_exchange_transitions() {
        let mut state = AppState::new();
        assert!(state.phase.is_idle());

        state.begin_recording().unwrap();
        assert!(state.phase.is_recording());

        state.begin_upload(PathBuf::from("/tmp/capture.wav")).unwrap();
        assert!(state.phase.is_uploading());
        assert_eq!(
            state.captured_audio,
            Some(PathBuf::from("/tmp/capture.wav"))
        );

        state.complete_exchange("bonjour".to_string(), Some("salut".to_string()));
        assert!(state.phase.is_done());
    }

    #[test]
    fn test_start_while_recording_is_rejected() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();

        let err = state.begin_recording().unwrap_err();
        assert!(matches!(err, ParrotError::RecordingError(_)));
        // State untouched by the rejection
        assert!(state.phase.is_recording());
    }

    #[test]
    fn test_start_while_uploading_is_rejected() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();
        state.begin_upload(PathBuf::from("/tmp/a.wav")).unwrap();

        assert!(state.begin_recording().is_err());
        assert!(state.phase.is_uploading());
    }

    #[test]
    fn test_stop_without_recording_is_rejected() {
        let mut state = AppState::new();
        let err = state.begin_upload(PathBuf::from("/tmp/a.wav")).unwrap_err();
        assert!(matches!(err, ParrotError::CaptureError(_)));
        assert!(state.phase.is_idle());
        assert!(state.captured_audio.is_none());
    }

    #[test]
    fn test_new_recording_clears_previous_exchange() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();
        state.begin_upload(PathBuf::from("/tmp/a.wav")).unwrap();
        state.complete_exchange("bonjour".to_string(), None);
        state.set_alert(&ParrotError::SpeechError("x".to_string()));

        state.begin_recording().unwrap();
        assert!(state.phase.is_recording());
        assert!(state.alert.is_none());
        assert!(state.captured_audio.is_none());
    }

    #[test]
    fn test_can_record_again_after_failure() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();
        state.begin_upload(PathBuf::from("/tmp/a.wav")).unwrap();
        state.fail_exchange(&ParrotError::UploadError("refused".to_string()));

        assert!(state.phase.is_failed());
        assert!(state.alert.is_some());

        state.begin_recording().unwrap();
        assert!(state.phase.is_recording());
    }

    #[test]
    fn test_fail_exchange_sets_french_alert() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();
        state.begin_upload(PathBuf::from("/tmp/a.wav")).unwrap();
        state.fail_exchange(&ParrotError::ServerError("HTTP 500".to_string()));

        assert_eq!(
            state.alert.as_deref(),
            Some("Échec de l'envoi de l'audio au backend.")
        );
        match &state.phase {
            Phase::Failed { reason } => assert!(reason.contains("HTTP 500")),
            other => panic!("expected Failed, got {}", other),
        }
    }

    #[test]
    fn test_abort_recording_returns_to_idle() {
        let mut state = AppState::new();
        state.begin_recording().unwrap();
        state.abort_recording(&ParrotError::AudioDeviceError("no device".to_string()));

        assert!(state.phase.is_idle());
        assert_eq!(
            state.alert.as_deref(),
            Some("Permission d'accès au micro refusée")
        );
    }

    #[test]
    fn test_done_without_response() {
        let mut state = AppState::new();
        state.complete_exchange("bonjour".to_string(), None);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.transcription(), Some("bonjour"));
        assert_eq!(snapshot.response(), None);
    }

    #[test]
    fn test_alert_dismiss() {
        let mut state = AppState::new();
        state.set_alert(&ParrotError::SpeechError("x".to_string()));
        assert!(state.alert.is_some());

        state.dismiss_alert();
        assert!(state.alert.is_none());
    }

    #[test]
    fn test_shared_state() {
        let shared = SharedAppState::new();

        assert!(!shared.is_recording());
        assert!(!shared.is_busy());

        {
            let mut state = shared.write();
            state.begin_recording().unwrap();
        }

        assert!(shared.is_recording());
        assert!(shared.is_busy());

        let snapshot = shared.snapshot();
        assert!(snapshot.phase.is_recording());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let shared = SharedAppState::new();

        let snapshot1 = shared.snapshot();
        assert!(snapshot1.phase.is_idle());

        {
            shared.write().begin_recording().unwrap();
        }

        // snapshot1 still shows idle
        assert!(snapshot1.phase.is_idle());

        let snapshot2 = shared.snapshot();
        assert!(snapshot2.phase.is_recording());
    }

    #[test]
    fn test_app_command_variants() {
        let _start = AppCommand::StartRecording;
        let _stop = AppCommand::StopRecording;
        let _shutdown = AppCommand::Shutdown;
    }

    #[test]
    fn test_app_event_variants() {
        let _changed = AppEvent::StateChanged;
        let _error = AppEvent::Error("test error".to_string());
        let _shutdown = AppEvent::Shutdown;
    }
}
