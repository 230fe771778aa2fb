//! Text-to-speech output
//!
//! The response text is spoken through the platform speech engine with a
//! configured language and rate.

pub mod synth;

pub use synth::{Speaker, SpeechCommand, SpeechConfig, SpeechEngine, SpeechEvent, SpeechHandle};
