//! Main Parrot application and eframe integration

use crate::pipeline::OrchestratorHandle;
use crate::state::{AppEvent, AppStateSnapshot, Phase};
use crate::ui::components::{ExchangePanel, RecordButton};
use crate::ui::theme::Theme;
use crossbeam_channel::Receiver;
use egui::{CentralPanel, RichText};
use tracing::{debug, error, info, warn};

/// Window title and heading
pub const APP_TITLE: &str = "🎙️ Enregistreur Audio";

/// Status line text for the given phase
pub fn status_text(phase: &Phase) -> &'static str {
    match phase {
        Phase::Idle => "Prêt à enregistrer",
        Phase::Recording => "Enregistrement en cours...",
        Phase::Uploading => "Envoi de l'audio au backend...",
        Phase::Done { .. } => "Échange terminé",
        Phase::Failed { .. } => "L'échange a échoué",
    }
}

/// Forward orchestrator events into egui repaints
///
/// egui only paints on input. Worker results that land while the window is
/// idle (a completed upload, a speech failure after the exchange finished)
/// would otherwise stay invisible until the next mouse move.
fn drive_repaints(events: Receiver<AppEvent>, ctx: egui::Context) {
    while let Ok(event) = events.recv() {
        match &event {
            AppEvent::StateChanged => debug!("State changed"),
            AppEvent::Error(e) => warn!("Orchestrator reported: {}", e),
            AppEvent::Shutdown => info!("Orchestrator shut down"),
        }
        ctx.request_repaint();
        if matches!(event, AppEvent::Shutdown) {
            return;
        }
    }
}

/// Main Parrot application
pub struct ParrotApp {
    /// Handle into the orchestrator (commands out, events and state in)
    handle: OrchestratorHandle,
    /// UI theme
    theme: Theme,
    /// Whether the app has been initialized
    initialized: bool,
}

impl ParrotApp {
    /// Create the application and apply the theme
    pub fn new(cc: &eframe::CreationContext<'_>, handle: OrchestratorHandle) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        let events = handle.event_receiver();
        let pump_ctx = cc.egui_ctx.clone();
        std::thread::spawn(move || drive_repaints(events, pump_ctx));

        Self {
            handle,
            theme,
            initialized: false,
        }
    }

    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        info!("Parrot UI initialized");
    }

    fn on_record_clicked(&mut self, snapshot: &AppStateSnapshot) {
        let result = if snapshot.phase.is_recording() {
            self.handle.stop_recording()
        } else if snapshot.phase.can_record() {
            self.handle.start_recording()
        } else {
            return;
        };

        if let Err(e) = result {
            error!("Failed to send command: {}", e);
        }
    }

    fn show_alert_banner(&mut self, ui: &mut egui::Ui, message: &str) {
        egui::Frame::group(ui.style())
            .fill(self.theme.error.gamma_multiply(0.15))
            .stroke(self.theme.alert_stroke())
            .rounding(self.theme.card_rounding)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        let heading = ui.label(
                            RichText::new("Erreur")
                                .strong()
                                .size(14.0)
                                .color(self.theme.error),
                        );
                        heading.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, "Erreur")
                        });

                        let body = ui.label(
                            RichText::new(message)
                                .size(13.0)
                                .color(self.theme.text_secondary),
                        );
                        let message_owned = message.to_string();
                        body.widget_info(move || {
                            egui::WidgetInfo::labeled(
                                egui::WidgetType::Label,
                                true,
                                &message_owned,
                            )
                        });
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        let dismiss = ui.button("OK");
                        dismiss.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, true, "OK")
                        });
                        if dismiss.clicked() {
                            self.handle.state().write().dismiss_alert();
                        }
                    });
                });
            });
    }
}

impl eframe::App for ParrotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.initialize();

        let snapshot = self.handle.state().snapshot();

        // Keep painting while an exchange is in flight so worker results
        // show up without user input
        if snapshot.phase.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);

                ui.label(
                    RichText::new(APP_TITLE)
                        .size(32.0)
                        .strong()
                        .color(self.theme.text_primary),
                );

                ui.add_space(self.theme.spacing_lg);

                let response = RecordButton::new(&snapshot.phase, &self.theme).show(ui);
                if response.clicked() {
                    self.on_record_clicked(&snapshot);
                }

                ui.add_space(self.theme.spacing);

                let status = ui.label(
                    RichText::new(status_text(&snapshot.phase))
                        .size(14.0)
                        .color(self.theme.text_muted),
                );
                let status_owned = status_text(&snapshot.phase);
                status.widget_info(move || {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, status_owned)
                });

                ui.add_space(self.theme.spacing_lg);

                // Exhaustive over the phase: a new variant cannot be left
                // silently unrendered
                match &snapshot.phase {
                    Phase::Idle | Phase::Recording | Phase::Uploading => {}
                    Phase::Done { .. } => {
                        ExchangePanel::new(&snapshot, &self.theme).show(ui);
                    }
                    Phase::Failed { .. } => {}
                }

                if let Some(ref message) = snapshot.alert {
                    ui.add_space(self.theme.spacing);
                    self.show_alert_banner(ui, message);
                }
            });
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Window closing, requesting orchestrator shutdown");
        if let Err(e) = self.handle.shutdown() {
            warn!("Failed to request shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_per_phase() {
        assert_eq!(status_text(&Phase::Idle), "Prêt à enregistrer");
        assert_eq!(status_text(&Phase::Recording), "Enregistrement en cours...");
        assert_eq!(
            status_text(&Phase::Uploading),
            "Envoi de l'audio au backend..."
        );
        assert_eq!(
            status_text(&Phase::Done {
                transcription: "x".into(),
                response: None
            }),
            "Échange terminé"
        );
        assert_eq!(
            status_text(&Phase::Failed {
                reason: "x".into()
            }),
            "L'échange a échoué"
        );
    }

    #[test]
    fn test_event_pump_requests_repaint() {
        let ctx = egui::Context::default();
        let (tx, rx) = crossbeam_channel::bounded(4);

        let pump_ctx = ctx.clone();
        let pump = std::thread::spawn(move || drive_repaints(rx, pump_ctx));

        // A speech failure after the exchange finished arrives as an error
        // event and must wake the painter
        tx.send(AppEvent::Error("la synthèse a échoué".to_string()))
            .unwrap();
        tx.send(AppEvent::Shutdown).unwrap();
        pump.join().unwrap();

        assert!(ctx.has_requested_repaint());
    }

    #[test]
    fn test_event_pump_exits_when_channel_closes() {
        let ctx = egui::Context::default();
        let (tx, rx) = crossbeam_channel::bounded::<AppEvent>(4);

        let pump = std::thread::spawn(move || drive_repaints(rx, ctx));
        drop(tx);
        pump.join().unwrap();
    }
}
