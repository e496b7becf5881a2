//! VisionPanel GUI Application
//!
//! Desktop control panel for a vision inference backend: model selection,
//! tuning parameters, the trigger hotkey and inference start/stop.

mod app;
mod ui;

use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui;
use visionpanel_core::{HttpGateway, PanelSettings};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("visionpanel=debug".parse()?)
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting VisionPanel v{}", visionpanel_core::VERSION);

    let settings = PanelSettings::load();
    tracing::debug!(?settings, "Loaded panel settings");

    let gateway = HttpGateway::from_settings(&settings).context("Failed to create backend client")?;

    // Create tokio runtime for async operations
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    // Window configuration
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 720.0])
            .with_min_inner_size([460.0, 560.0])
            .with_title("VisionPanel - Inference Control"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "VisionPanel",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::PanelApp::new(
                cc,
                runtime,
                settings,
                Arc::new(gateway),
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {e}"))
}
