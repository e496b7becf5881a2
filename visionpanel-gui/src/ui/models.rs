//! Model management window.

use eframe::egui::{self, RichText, Rounding, Vec2};

use crate::app::PanelApp;
use crate::ui::colors;

/// Render the model management window.
pub fn render(app: &mut PanelApp, ctx: &egui::Context, enabled: bool) {
    let mut open = app.show_models;
    let mut delete: Option<String> = None;
    let mut refresh = false;

    let registry = app.controller.registry();

    egui::Window::new("Manage models")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            let muted = colors::muted(ui.visuals());
            ui.add_enabled_ui(enabled, |ui| {
                if registry.is_empty() {
                    ui.add_space(12.0);
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("No models available.").color(muted));
                    });
                    ui.add_space(12.0);
                } else {
                    egui::ScrollArea::vertical()
                        .max_height(320.0)
                        .show(ui, |ui| {
                            egui::Grid::new("model_list")
                                .num_columns(3)
                                .striped(true)
                                .spacing([16.0, 8.0])
                                .show(ui, |ui| {
                                    for (id, entry) in registry.entries() {
                                        ui.label(RichText::new(&entry.name).strong())
                                            .on_hover_text(id);
                                        ui.label(RichText::new(&entry.size).color(muted));
                                        if ui
                                            .add(
                                                egui::Button::new(
                                                    RichText::new("Delete").color(colors::ERROR),
                                                )
                                                .rounding(Rounding::same(6.0)),
                                            )
                                            .clicked()
                                        {
                                            delete = Some(id.to_string());
                                        }
                                        ui.end_row();
                                    }
                                });
                        });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Refresh").clicked() {
                        refresh = true;
                    }
                    ui.label(
                        RichText::new(format!("{} model(s)", registry.len()))
                            .size(11.0)
                            .color(muted),
                    );
                });
            });
        });

    app.show_models = open;
    if let Some(id) = delete {
        app.controller.delete_model(&id);
    }
    if refresh {
        app.controller.refresh_models();
    }
}
