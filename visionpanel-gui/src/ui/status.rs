//! Status bar at the bottom of the window.

use eframe::egui::{self, RichText};
use visionpanel_core::InitState;

use crate::app::PanelApp;
use crate::ui::colors;

/// Render the status bar.
pub fn render(app: &PanelApp, ui: &mut egui::Ui) {
    let muted = colors::muted(ui.visuals());

    ui.horizontal(|ui| {
        // Backend connection state
        let (text, color) = match app.controller.init_state() {
            InitState::NotStarted | InitState::Loading => ("Connecting...", muted),
            InitState::Ready => ("Connected", colors::SUCCESS),
            InitState::Failed => ("Backend unavailable", colors::ERROR),
        };
        ui.label(RichText::new(text).size(11.0).color(color));
        ui.separator();
        ui.label(
            RichText::new(&app.settings.backend_url)
                .size(11.0)
                .color(muted),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("v{}", visionpanel_core::VERSION))
                    .size(11.0)
                    .color(muted),
            );
            ui.separator();

            let display = app.controller.display();
            ui.label(
                RichText::new(format!("{}×{}", display.width, display.height))
                    .size(11.0)
                    .color(muted),
            );

            if app.controller.is_busy() {
                ui.separator();
                ui.spinner();
            }
        });
    });
}
