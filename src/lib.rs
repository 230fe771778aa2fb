//! Parrot - push-to-talk voice client
//!
//! Records the microphone, sends the capture to an assistant backend for
//! transcription and response generation, shows both texts, and speaks the
//! response aloud through the platform speech engine.

pub mod audio;
pub mod config;
pub mod error;
pub mod net;
pub mod pipeline;
pub mod speech;
pub mod state;
pub mod ui;

// Re-export error types
pub use error::{ParrotError, Result};

// Re-export configuration
pub use config::{load_config, save_config, AppConfig};

// Re-export state types
pub use state::{AppCommand, AppEvent, AppState, AppStateSnapshot, Phase, SharedAppState};

// Re-export the pipeline entry points
pub use pipeline::{Orchestrator, OrchestratorConfig, OrchestratorHandle};
