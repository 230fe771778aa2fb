//! Parrot - push-to-talk voice client
//!
//! Main entry point for the Parrot application.

use anyhow::Context;
use eframe::egui;
use parrot::ui::ParrotApp;
use parrot::{Orchestrator, OrchestratorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parrot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Parrot voice client");

    let config = parrot::load_config().context("failed to load configuration")?;
    tracing::info!("Backend endpoint: {}", config.endpoint);

    let (orchestrator, handle) = Orchestrator::new(OrchestratorConfig::from(&config))
        .context("failed to create orchestrator")?;
    let _workers = orchestrator
        .start()
        .context("failed to start orchestrator")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 640.0])
            .with_min_inner_size([320.0, 480.0])
            .with_title("Parrot"),
        ..Default::default()
    };

    eframe::run_native(
        "Parrot",
        options,
        Box::new(move |cc| Ok(Box::new(ParrotApp::new(cc, handle)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run the UI: {e}"))
}
