//! Transcription and response panels
//!
//! Shown only for a completed exchange: the captured notice, what the
//! backend heard, and what the dialogue engine answered. The response panel
//! is absent when the backend returned no action text.

use crate::state::AppStateSnapshot;
use crate::ui::theme::Theme;
use egui::{RichText, ScrollArea, Ui};

/// Notice shown above the panels once a capture made it to the backend
pub const CAPTURED_NOTICE: &str = "Audio enregistré avec succès 🎉";
/// Header of the transcription panel
pub const TRANSCRIPTION_HEADER: &str = "Transcription :";
/// Header of the response panel
pub const RESPONSE_HEADER: &str = "Texte reçu :";

/// Panels showing the outcome of the last completed exchange
pub struct ExchangePanel<'a> {
    snapshot: &'a AppStateSnapshot,
    theme: &'a Theme,
    max_height: f32,
}

impl<'a> ExchangePanel<'a> {
    /// Create a new exchange panel
    pub fn new(snapshot: &'a AppStateSnapshot, theme: &'a Theme) -> Self {
        Self {
            snapshot,
            theme,
            max_height: 120.0,
        }
    }

    /// Set the maximum height of each scrollable text area
    pub fn max_height(mut self, height: f32) -> Self {
        self.max_height = height;
        self
    }

    /// Show the panels; renders nothing unless the exchange completed
    pub fn show(&self, ui: &mut Ui) {
        let Some(transcription) = self.snapshot.transcription() else {
            return;
        };

        let notice = ui.label(
            RichText::new(CAPTURED_NOTICE)
                .size(14.0)
                .color(self.theme.success),
        );
        notice.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, CAPTURED_NOTICE)
        });

        ui.add_space(self.theme.spacing_sm);

        self.text_panel(ui, TRANSCRIPTION_HEADER, transcription, "transcription");

        if let Some(response) = self.snapshot.response() {
            ui.add_space(self.theme.spacing_sm);
            self.text_panel(ui, RESPONSE_HEADER, response, "response");
        }
    }

    fn text_panel(&self, ui: &mut Ui, header: &str, text: &str, salt: &str) {
        ui.group(|ui| {
            ui.vertical(|ui| {
                ui.set_min_width(ui.available_width());

                let header_label = ui.label(
                    RichText::new(header)
                        .strong()
                        .size(14.0)
                        .color(self.theme.text_primary),
                );
                let header_owned = header.to_string();
                header_label.widget_info(move || {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &header_owned)
                });

                ui.add_space(4.0);
                ui.separator();
                ui.add_space(4.0);

                ScrollArea::vertical()
                    .id_salt(salt.to_string())
                    .max_height(self.max_height)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new(text)
                                .color(self.theme.text_secondary)
                                .size(14.0),
                        );
                    });
            });
        });
    }
}
