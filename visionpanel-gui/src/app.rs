//! Application state and main loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use visionpanel_core::{
    BackendGateway, DisplayBounds, InterceptFlag, KeyDown, Modifiers, ModelUpload, PanelSettings,
    SettingsController, SystemClock,
};

use crate::ui;
use crate::ui::notifications::ToastCenter;

/// Repaint cadence while a backend call is outstanding.
const BUSY_REPAINT: Duration = Duration::from_millis(50);

/// Main application state.
pub struct PanelApp {
    /// Tokio runtime for backend calls and file dialogs.
    runtime: Runtime,

    /// Panel-side settings (backend URL, autosave delay, display override).
    pub settings: PanelSettings,

    /// Owner of all configuration state.
    pub controller: SettingsController,

    /// Notification sink shared with background tasks.
    pub toasts: Arc<ToastCenter>,

    /// Set while the hotkey field is recording.
    intercept: InterceptFlag,

    /// Modifier state seen on the previous frame, for synthesizing
    /// modifier-only key presses.
    last_modifiers: egui::Modifiers,

    /// Whether `initialize` has been issued.
    started: bool,

    /// Show the model management window.
    pub show_models: bool,

    /// Screen area of the hotkey field, for click-outside detection.
    pub hotkey_rect: Option<egui::Rect>,

    /// Pending model file selection.
    pick_result_rx: Option<tokio::sync::oneshot::Receiver<Option<ModelUpload>>>,
}

impl PanelApp {
    /// Create a new application instance.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        runtime: Runtime,
        settings: PanelSettings,
        gateway: Arc<dyn BackendGateway>,
    ) -> Self {
        info!(backend = %settings.backend_url, "Initializing PanelApp");

        let toasts = Arc::new(ToastCenter::new());
        toasts.attach(&cc.egui_ctx);

        let intercept = InterceptFlag::new();
        let controller = SettingsController::new(
            gateway,
            toasts.clone(),
            runtime.handle().clone(),
            Arc::new(SystemClock),
            Box::new(intercept.clone()),
            settings.autosave_delay(),
        );

        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        cc.egui_ctx.set_style(style);

        Self {
            runtime,
            settings,
            controller,
            toasts,
            intercept,
            last_modifiers: egui::Modifiers::NONE,
            started: false,
            show_models: false,
            hotkey_rect: None,
            pick_result_rx: None,
        }
    }

    /// Display resolution: settings override, then the monitor egui reports,
    /// then the fallback.
    fn resolve_display(&self, ctx: &egui::Context) -> DisplayBounds {
        if let Some(bounds) = self.settings.display {
            debug!(?bounds, "Using display override from settings");
            return bounds;
        }

        let detected = ctx.input(|i| {
            i.viewport()
                .monitor_size
                .map(|size| size * i.pixels_per_point)
        });
        match detected {
            Some(size) if size.x >= 1.0 && size.y >= 1.0 => {
                DisplayBounds::new(size.x.round() as u32, size.y.round() as u32)
            }
            _ => {
                warn!("Monitor size unavailable, using fallback display bounds");
                DisplayBounds::FALLBACK
            }
        }
    }

    /// Open a model file dialog asynchronously.
    pub fn open_model_dialog(&mut self) {
        // Don't open another dialog if one is pending
        if self.pick_result_rx.is_some() {
            return;
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.pick_result_rx = Some(rx);

        self.runtime.spawn(async move {
            let picked = match rfd::AsyncFileDialog::new()
                .add_filter("Model files", visionpanel_core::models::SUPPORTED_EXTENSIONS)
                .pick_file()
                .await
            {
                Some(file) => Some(ModelUpload::new(file.file_name(), file.read().await)),
                None => None,
            };
            let _ = tx.send(picked);
        });
    }

    /// Check for model file selection completion.
    fn check_model_selection(&mut self) {
        if let Some(mut rx) = self.pick_result_rx.take() {
            match rx.try_recv() {
                Ok(Some(upload)) => {
                    info!(file = %upload.file_name, bytes = upload.bytes.len(), "Model file selected");
                    self.controller.import_model(upload);
                }
                Ok(None) => {
                    // User cancelled the dialog
                    debug!("Model selection cancelled");
                }
                Err(tokio::sync::oneshot::error::TryRecvError::Empty) => {
                    // Still waiting
                    self.pick_result_rx = Some(rx);
                }
                Err(tokio::sync::oneshot::error::TryRecvError::Closed) => {
                    warn!("Model selection channel closed unexpectedly");
                }
            }
        }
    }

    /// While recording a hotkey, take key events out of egui's queue before
    /// any widget sees them and feed them to the capture machine.
    fn intercept_keys(&mut self, ctx: &egui::Context) {
        let current = ctx.input(|i| i.modifiers);
        let previous = std::mem::replace(&mut self.last_modifiers, current);

        if !self.intercept.is_active() {
            return;
        }

        let presses = ctx.input_mut(|input| {
            let presses = capture_presses(&input.events, current, previous);
            input.events.retain(|event| !is_keyboard_event(event));
            presses
        });

        for press in presses {
            if !self.controller.hotkey().is_capturing() {
                break;
            }
            self.controller.hotkey_key_down(&press);
        }
    }

    /// End a capture when the user clicks anywhere but the hotkey field.
    fn check_click_outside(&mut self, ctx: &egui::Context) {
        if !self.controller.hotkey().is_capturing() {
            return;
        }
        let click = ctx.input(|i| {
            if i.pointer.any_pressed() {
                i.pointer.interact_pos()
            } else {
                None
            }
        });
        if let (Some(pos), Some(rect)) = (click, self.hotkey_rect) {
            if !rect.contains(pos) {
                self.controller.hotkey_click_outside();
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        if let Some(deadline) = self.controller.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(Instant::now()));
        }
        if self.controller.is_busy() || self.pick_result_rx.is_some() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
        if !self.toasts.live(chrono::Utc::now()).is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

/// Key presses for the capture machine from one frame of egui input.
///
/// Modifier keys produce no key events of their own, so their rising edges
/// are synthesized from the modifier state. egui-winit turns command+X/C/V
/// into clipboard events without a key event; those map back to the letter.
/// With an empty clipboard command+V produces no paste event at all, only the
/// key release, which stands in for the press.
fn capture_presses(
    events: &[egui::Event],
    current: egui::Modifiers,
    previous: egui::Modifiers,
) -> Vec<KeyDown> {
    let mut presses = Vec::new();

    for (now, before, name) in [
        (current.ctrl, previous.ctrl, "Control"),
        (current.alt, previous.alt, "Alt"),
        (current.shift, previous.shift, "Shift"),
        (current.mac_cmd, previous.mac_cmd, "Meta"),
    ] {
        if now && !before {
            presses.push(KeyDown::new(name, to_modifiers(current)));
        }
    }

    let mut clipboard_seen = false;
    for event in events {
        match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => presses.push(KeyDown::new(key.name(), to_modifiers(*modifiers))),
            egui::Event::Key {
                key,
                pressed: false,
                modifiers,
                ..
            } if modifiers.command && is_clipboard_letter(*key) && !clipboard_seen => {
                presses.push(KeyDown::new(key.name(), to_modifiers(*modifiers)));
            }
            egui::Event::Cut => {
                clipboard_seen = true;
                presses.push(KeyDown::new("X", to_modifiers(current)));
            }
            egui::Event::Copy => {
                clipboard_seen = true;
                presses.push(KeyDown::new("C", to_modifiers(current)));
            }
            egui::Event::Paste(_) => {
                clipboard_seen = true;
                presses.push(KeyDown::new("V", to_modifiers(current)));
            }
            _ => {}
        }
    }

    presses
}

fn is_clipboard_letter(key: egui::Key) -> bool {
    matches!(key, egui::Key::X | egui::Key::C | egui::Key::V)
}

/// Events swallowed while recording a hotkey.
fn is_keyboard_event(event: &egui::Event) -> bool {
    matches!(
        event,
        egui::Event::Key { .. }
            | egui::Event::Text(_)
            | egui::Event::Copy
            | egui::Event::Cut
            | egui::Event::Paste(_)
    )
}

fn to_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: modifiers.ctrl,
        alt: modifiers.alt,
        shift: modifiers.shift,
        meta: modifiers.mac_cmd,
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.started {
            let display = self.resolve_display(ctx);
            self.controller.initialize(display);
            self.started = true;
        }

        // Key capture must run before any widget reads input
        self.intercept_keys(ctx);
        self.check_click_outside(ctx);

        // Check for async completions
        self.check_model_selection();
        self.controller.tick();

        let confirming = self.toasts.is_confirming();

        // Status bar at bottom
        egui::TopBottomPanel::bottom("status_panel")
            .max_height(24.0)
            .show(ctx, |ui| {
                ui::status::render(self, ui);
            });

        // Main settings area, outlined while inference runs
        let mut frame = egui::Frame::central_panel(&ctx.style());
        if self.controller.is_running() {
            frame = frame.stroke(egui::Stroke::new(2.0, ui::colors::SUCCESS));
        }
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.add_enabled_ui(!confirming, |ui| {
                ui::controls::render(self, ui);
            });
        });

        if self.show_models {
            ui::models::render(self, ctx, !confirming);
        }

        ui::notifications::render(&self.toasts, ctx);

        self.schedule_repaint(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_alt() -> egui::Modifiers {
        egui::Modifiers {
            alt: true,
            ctrl: true,
            command: true,
            ..egui::Modifiers::NONE
        }
    }

    fn key(key: egui::Key, pressed: bool, modifiers: egui::Modifiers) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers,
        }
    }

    fn names(presses: &[KeyDown]) -> Vec<&str> {
        presses.iter().map(|p| p.key.as_str()).collect()
    }

    #[test]
    fn test_modifier_edges_are_synthesized() {
        let presses = capture_presses(&[], ctrl_alt(), egui::Modifiers::NONE);
        assert_eq!(names(&presses), vec!["Control", "Alt"]);
        assert!(presses[1].modifiers.ctrl && presses[1].modifiers.alt);

        let held = capture_presses(&[], ctrl_alt(), ctrl_alt());
        assert!(held.is_empty(), "held modifiers are not pressed again");
    }

    #[test]
    fn test_cut_event_maps_to_x() {
        let presses = capture_presses(&[egui::Event::Cut], ctrl_alt(), ctrl_alt());
        assert_eq!(presses, vec![KeyDown::new("X", to_modifiers(ctrl_alt()))]);
    }

    #[test]
    fn test_copy_and_paste_map_to_letters() {
        let copy = capture_presses(&[egui::Event::Copy], ctrl_alt(), ctrl_alt());
        assert_eq!(names(&copy), vec!["C"]);

        let paste = capture_presses(
            &[egui::Event::Paste("clip".to_string())],
            ctrl_alt(),
            ctrl_alt(),
        );
        assert_eq!(names(&paste), vec!["V"]);
    }

    #[test]
    fn test_paste_with_empty_clipboard_uses_release() {
        let events = [key(egui::Key::V, false, ctrl_alt())];
        let presses = capture_presses(&events, ctrl_alt(), ctrl_alt());
        assert_eq!(names(&presses), vec!["V"]);
    }

    #[test]
    fn test_release_after_clipboard_event_is_not_doubled() {
        let events = [egui::Event::Cut, key(egui::Key::X, false, ctrl_alt())];
        let presses = capture_presses(&events, ctrl_alt(), ctrl_alt());
        assert_eq!(names(&presses), vec!["X"]);
    }

    #[test]
    fn test_plain_key_press_and_release() {
        let shift = egui::Modifiers {
            shift: true,
            ..egui::Modifiers::NONE
        };
        let events = [
            key(egui::Key::F5, true, shift),
            key(egui::Key::F5, false, shift),
        ];
        let presses = capture_presses(&events, shift, shift);
        assert_eq!(presses, vec![KeyDown::new("F5", to_modifiers(shift))]);
    }

    #[test]
    fn test_keyboard_events_are_swallowed() {
        assert!(is_keyboard_event(&egui::Event::Paste(String::new())));
        assert!(is_keyboard_event(&egui::Event::Text("x".to_string())));
        assert!(is_keyboard_event(&key(egui::Key::A, true, egui::Modifiers::NONE)));
        assert!(!is_keyboard_event(&egui::Event::PointerGone));
    }
}
