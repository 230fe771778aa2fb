//! Exchange pipeline
//!
//! The orchestrator sequences one exchange at a time: capture, upload,
//! display, speak.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorHandle};
