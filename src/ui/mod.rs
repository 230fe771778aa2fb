//! User interface built on egui/eframe
//!
//! One screen: a record toggle, a status line, the exchange panels, and an
//! alert banner. Rendering is a pure function of the shared state snapshot.

pub mod app;
pub mod components;
pub mod theme;

pub use app::{status_text, ParrotApp, APP_TITLE};
pub use components::{ExchangePanel, RecordButton};
pub use theme::Theme;
