//! Error types for the Parrot application
//!
//! Every failure class carries an internal (English) message for logs and
//! maps to the French alert string shown to the user.

use thiserror::Error;

/// Parrot application errors
#[derive(Error, Debug, Clone)]
pub enum ParrotError {
    /// Audio input device unavailable or unusable (the desktop analogue of a
    /// denied microphone permission)
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Failed to start a capture
    #[error("Recording error: {0}")]
    RecordingError(String),

    /// Failed to stop or finalize a capture (no active session, empty
    /// capture, WAV write failure)
    #[error("Capture error: {0}")]
    CaptureError(String),

    /// Transport-level upload failure
    #[error("Upload error: {0}")]
    UploadError(String),

    /// The backend answered with a non-success status or an error body
    #[error("Server error: {0}")]
    ServerError(String),

    /// The backend reply could not be parsed
    #[error("Malformed reply: {0}")]
    ReplyError(String),

    /// Text-to-speech failure
    #[error("Speech error: {0}")]
    SpeechError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    IOError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for ParrotError {
    fn from(e: std::io::Error) -> Self {
        ParrotError::IOError(e.to_string())
    }
}

impl From<hound::Error> for ParrotError {
    fn from(e: hound::Error) -> Self {
        ParrotError::CaptureError(e.to_string())
    }
}

impl ParrotError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors allow the application to continue running,
    /// while non-recoverable errors may require user intervention or restart.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            ParrotError::AudioDeviceError(_) => false,
            // Capture errors are per-attempt; the next attempt may succeed
            ParrotError::RecordingError(_) => true,
            ParrotError::CaptureError(_) => true,
            // Network and backend errors are typically transient
            ParrotError::UploadError(_) => true,
            ParrotError::ServerError(_) => true,
            ParrotError::ReplyError(_) => true,
            // Speech failures never roll back a displayed response
            ParrotError::SpeechError(_) => true,
            // Channel errors indicate internal issues
            ParrotError::ChannelError(_) => false,
            // IO errors may require user intervention
            ParrotError::IOError(_) => false,
            // Config errors require user intervention
            ParrotError::ConfigError(_) => false,
        }
    }

    /// Get a user-facing description of the error
    ///
    /// Returns the alert message shown in the UI. The application speaks
    /// French to its users.
    pub fn user_message(&self) -> String {
        match self {
            ParrotError::AudioDeviceError(_) => {
                "Permission d'accès au micro refusée".to_string()
            }
            ParrotError::RecordingError(_) => {
                "Impossible de démarrer l'enregistrement.".to_string()
            }
            ParrotError::CaptureError(_) => {
                "Impossible d'arrêter l'enregistrement.".to_string()
            }
            ParrotError::UploadError(_)
            | ParrotError::ServerError(_)
            | ParrotError::ReplyError(_) => {
                "Échec de l'envoi de l'audio au backend.".to_string()
            }
            ParrotError::SpeechError(_) => {
                "Impossible de lire le texte vocalement.".to_string()
            }
            ParrotError::ChannelError(_) => {
                "Erreur interne de communication. Veuillez redémarrer l'application.".to_string()
            }
            ParrotError::IOError(_) => "Erreur du système de fichiers.".to_string(),
            ParrotError::ConfigError(_) => {
                "Configuration invalide. Vérifiez le fichier de configuration.".to_string()
            }
        }
    }
}

/// Result type alias for Parrot operations
pub type Result<T> = std::result::Result<T, ParrotError>;
