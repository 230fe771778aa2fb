//! Reusable UI components

pub mod exchange_panel;
pub mod record_button;

pub use exchange_panel::ExchangePanel;
pub use record_button::RecordButton;
