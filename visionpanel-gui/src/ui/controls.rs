//! Main settings panel: model, parameters, toggles, hotkey and start/stop.

use eframe::egui::{self, RichText, Rounding, Vec2};
use visionpanel_core::{RangeName, ToggleName};

use crate::app::PanelApp;
use crate::ui::colors;

/// Render the settings panel.
pub fn render(app: &mut PanelApp, ui: &mut egui::Ui) {
    let muted = colors::muted(ui.visuals());
    let running = app.controller.is_running();

    ui.spacing_mut().item_spacing = Vec2::new(8.0, 10.0);

    egui::ScrollArea::vertical().show(ui, |ui| {
        // -----------------------------------------------------------------
        // Model
        // -----------------------------------------------------------------
        ui.heading("Model");
        ui.separator();
        render_model_row(app, ui, muted);
        ui.add_space(12.0);

        // -----------------------------------------------------------------
        // Parameters
        // -----------------------------------------------------------------
        ui.heading("Parameters");
        ui.separator();
        egui::Grid::new("range_grid")
            .num_columns(3)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                for name in RangeName::ALL {
                    render_range_row(app, ui, name);
                    ui.end_row();
                }
            });
        ui.add_space(12.0);

        // -----------------------------------------------------------------
        // Toggles
        // -----------------------------------------------------------------
        ui.heading("Display");
        ui.separator();
        let toggles: Vec<(ToggleName, bool)> = app.controller.toggles().iter().collect();
        for (name, mut on) in toggles {
            if ui.checkbox(&mut on, name.label()).changed() {
                app.controller.set_toggle(name, on);
            }
        }
        ui.add_space(12.0);

        // -----------------------------------------------------------------
        // Hotkey
        // -----------------------------------------------------------------
        ui.heading("Trigger hotkey");
        ui.separator();
        render_hotkey(app, ui, muted);
        ui.add_space(16.0);

        // -----------------------------------------------------------------
        // Lifecycle
        // -----------------------------------------------------------------
        render_lifecycle(app, ui, running, muted);
    });
}

fn render_model_row(app: &mut PanelApp, ui: &mut egui::Ui, muted: egui::Color32) {
    let mut choice: Option<String> = None;
    let mut import = false;
    let mut manage = false;

    {
        let registry = app.controller.registry();
        let selected_text = match registry.selected() {
            Some(id) => registry.name_of(id).to_string(),
            None => "No models available".to_string(),
        };

        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("model_select")
                .width(240.0)
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (id, entry) in registry.entries() {
                        let label = format!("{}  ({})", entry.name, entry.size);
                        if ui
                            .selectable_label(registry.selected() == Some(id), label)
                            .clicked()
                        {
                            choice = Some(id.to_string());
                        }
                    }
                });

            let importing = registry.importing().is_some();
            if ui
                .add_enabled(!importing, egui::Button::new("Import model"))
                .on_hover_text("Upload a .pt or .onnx file to the backend")
                .clicked()
            {
                import = true;
            }
            if ui.button("Manage models").clicked() {
                manage = true;
            }
        });

        if let Some(file) = registry.importing() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(format!("Uploading {file}...")).color(muted));
            });
        }
    }

    if let Some(id) = choice {
        app.controller.select_model(&id);
    }
    if import {
        app.open_model_dialog();
    }
    if manage {
        app.show_models = true;
    }
}

fn render_range_row(app: &mut PanelApp, ui: &mut egui::Ui, name: RangeName) {
    let control = app.controller.range(name);
    let (min, max) = control.bounds();
    let mut value = control.value();
    let mut text = control.text().to_string();

    ui.label(name.label());

    let slider = ui.add(
        egui::Slider::new(&mut value, min..=max).show_value(false),
    );
    if slider.changed() {
        app.controller.slide_range(name, value);
    }

    let field = ui.add(
        egui::TextEdit::singleline(&mut text)
            .desired_width(64.0)
            .horizontal_align(egui::Align::RIGHT),
    );
    if field.changed() {
        app.controller.edit_range_text(name, text);
    }
    // Enter also drops focus on a single-line field
    if field.lost_focus() && app.controller.range(name).is_editing() {
        app.controller.commit_range_text(name);
    }
}

fn render_hotkey(app: &mut PanelApp, ui: &mut egui::Ui, muted: egui::Color32) {
    let hotkey = app.controller.hotkey();
    let capturing = hotkey.is_capturing();
    let text = hotkey.field_text().to_string();
    let placeholder = !capturing && hotkey.hotkey().is_empty();

    let label = if placeholder {
        RichText::new(text).monospace().color(muted)
    } else {
        RichText::new(text).monospace().strong()
    };

    let response = ui.add(
        egui::Button::new(label)
            .min_size(Vec2::new(260.0, 30.0))
            .selected(capturing)
            .rounding(Rounding::same(6.0)),
    );
    app.hotkey_rect = Some(response.rect);

    if response.clicked() {
        app.controller.begin_hotkey_capture();
    }
    if capturing {
        ui.label(
            RichText::new("Press a key combination, or click elsewhere to keep the current one.")
                .size(11.0)
                .color(muted),
        );
    }
}

fn render_lifecycle(app: &mut PanelApp, ui: &mut egui::Ui, running: bool, muted: egui::Color32) {
    let pending = app.controller.lifecycle_pending();

    ui.horizontal(|ui| {
        if running {
            if ui
                .add_enabled(
                    !pending,
                    egui::Button::new(RichText::new("Stop inference").strong())
                        .fill(colors::ERROR)
                        .min_size(Vec2::new(160.0, 36.0))
                        .rounding(Rounding::same(8.0)),
                )
                .clicked()
            {
                app.controller.stop();
            }
        } else if ui
            .add_enabled(
                !pending,
                egui::Button::new(RichText::new("Start inference").strong())
                    .fill(colors::ACCENT)
                    .min_size(Vec2::new(160.0, 36.0))
                    .rounding(Rounding::same(8.0)),
            )
            .clicked()
        {
            app.controller.start();
        }

        if pending {
            ui.spinner();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if running {
                ui.label(RichText::new("● Active").strong().color(colors::SUCCESS));
            } else {
                ui.label(RichText::new("○ Idle").color(muted));
            }
        });
    });
}
