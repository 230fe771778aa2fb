//! Record toggle button
//!
//! Custom-painted circular control. Idle shows a microphone, recording shows
//! a stop square with a pulsing ring, uploading shows a spinner and refuses
//! clicks.

use crate::state::Phase;
use crate::ui::theme::Theme;
use egui::{Color32, Rect, Sense, Vec2};

/// Accessibility label while idle
pub const LABEL_START: &str = "Démarrer";
/// Accessibility label while recording
pub const LABEL_STOP: &str = "Arrêter l'enregistrement";
/// Accessibility label while uploading
pub const LABEL_BUSY: &str = "Envoi en cours";

/// Record button driven by the current phase
pub struct RecordButton<'a> {
    phase: &'a Phase,
    theme: &'a Theme,
}

impl<'a> RecordButton<'a> {
    /// Create a new record button
    pub fn new(phase: &'a Phase, theme: &'a Theme) -> Self {
        Self { phase, theme }
    }

    /// The label matching the current phase
    pub fn label(&self) -> &'static str {
        if self.phase.is_recording() {
            LABEL_STOP
        } else if self.phase.is_uploading() {
            LABEL_BUSY
        } else {
            LABEL_START
        }
    }

    /// Show the button and return its response
    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let enabled = !self.phase.is_uploading();
        let sense = if enabled { Sense::click() } else { Sense::hover() };

        let size = Vec2::new(72.0, 72.0);
        let (rect, response) = ui.allocate_exact_size(size, sense);

        if ui.is_rect_visible(rect) {
            self.paint(ui, rect, &response);
        }

        let label = self.label();
        response.widget_info(move || {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label)
        });

        response
    }

    fn paint(&self, ui: &mut egui::Ui, rect: Rect, response: &egui::Response) {
        let painter = ui.painter();
        let center = rect.center();

        let bg_color = if self.phase.is_recording() {
            self.theme.recording
        } else if self.phase.is_uploading() {
            self.theme.bg_tertiary
        } else if response.hovered() {
            self.theme.primary.gamma_multiply(1.2)
        } else {
            self.theme.primary
        };

        painter.circle_filled(center, 32.0, bg_color);

        if response.hovered() && self.phase.can_record() {
            painter.circle_stroke(
                center,
                33.0,
                egui::Stroke::new(2.0, self.theme.primary.gamma_multiply(0.6)),
            );
        }

        if self.phase.is_recording() {
            self.draw_stop_icon(painter, center);
            self.draw_pulsing_ring(ui, center);
        } else if self.phase.is_uploading() {
            self.draw_spinner(ui, center);
        } else {
            self.draw_mic_icon(painter, center);
        }
    }

    /// Stop square shown while recording
    fn draw_stop_icon(&self, painter: &egui::Painter, center: egui::Pos2) {
        painter.rect_filled(
            Rect::from_center_size(center, Vec2::splat(18.0)),
            2.0,
            Color32::WHITE,
        );
    }

    /// Rotating dots shown while uploading
    fn draw_spinner(&self, ui: &egui::Ui, center: egui::Pos2) {
        let painter = ui.painter();
        let t = ui.ctx().input(|i| i.time);
        let angle = t * 3.0;

        for i in 0..3 {
            let dot_angle = angle + (i as f64 * std::f64::consts::TAU / 3.0);
            let radius = 10.0;
            let dot_pos = egui::pos2(
                center.x + (dot_angle.cos() as f32 * radius),
                center.y + (dot_angle.sin() as f32 * radius),
            );

            let alpha = 1.0 - (i as f32 * 0.3);
            let color = Color32::from_white_alpha((255.0 * alpha) as u8);
            painter.circle_filled(dot_pos, 3.5, color);
        }

        ui.ctx().request_repaint();
    }

    /// Microphone glyph shown while idle
    fn draw_mic_icon(&self, painter: &egui::Painter, center: egui::Pos2) {
        let color = Color32::WHITE;

        // Mic body
        let mic_rect = Rect::from_center_size(
            egui::pos2(center.x, center.y - 3.0),
            Vec2::new(9.0, 16.0),
        );
        painter.rect_filled(mic_rect, 4.5, color);

        // Stand arc, approximated with line segments
        let arc_center = egui::pos2(center.x, center.y + 3.0);
        let arc_radius = 11.0;
        let num_segments = 8;
        for i in 0..num_segments {
            let start_angle = std::f32::consts::PI * (i as f32 / num_segments as f32);
            let end_angle = std::f32::consts::PI * ((i + 1) as f32 / num_segments as f32);

            let start = egui::pos2(
                arc_center.x - arc_radius * start_angle.cos(),
                arc_center.y + arc_radius * start_angle.sin(),
            );
            let end = egui::pos2(
                arc_center.x - arc_radius * end_angle.cos(),
                arc_center.y + arc_radius * end_angle.sin(),
            );

            painter.line_segment([start, end], egui::Stroke::new(2.0, color));
        }

        // Stem and base
        let stem_top = egui::pos2(center.x, arc_center.y + arc_radius);
        let stem_bottom = egui::pos2(center.x, arc_center.y + arc_radius + 5.0);
        painter.line_segment([stem_top, stem_bottom], egui::Stroke::new(2.0, color));
        painter.line_segment(
            [
                egui::pos2(center.x - 6.0, stem_bottom.y),
                egui::pos2(center.x + 6.0, stem_bottom.y),
            ],
            egui::Stroke::new(2.0, color),
        );
    }

    /// Pulsing ring shown while recording
    fn draw_pulsing_ring(&self, ui: &egui::Ui, center: egui::Pos2) {
        let painter = ui.painter();
        let t = ui.ctx().input(|i| i.time);
        let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;

        let radius = 34.0 + pulse * 8.0;
        let alpha = (1.0 - pulse) * 0.6;

        painter.circle_stroke(
            center,
            radius,
            egui::Stroke::new(
                2.0 + pulse * 2.0,
                self.theme.recording.gamma_multiply(alpha),
            ),
        );

        ui.ctx().request_repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_follows_phase() {
        let theme = Theme::dark();

        assert_eq!(RecordButton::new(&Phase::Idle, &theme).label(), LABEL_START);
        assert_eq!(
            RecordButton::new(&Phase::Recording, &theme).label(),
            LABEL_STOP
        );
        assert_eq!(
            RecordButton::new(&Phase::Uploading, &theme).label(),
            LABEL_BUSY
        );

        let done = Phase::Done {
            transcription: "bonjour".into(),
            response: None,
        };
        assert_eq!(RecordButton::new(&done, &theme).label(), LABEL_START);

        let failed = Phase::Failed {
            reason: "boom".into(),
        };
        assert_eq!(RecordButton::new(&failed, &theme).label(), LABEL_START);
    }
}
