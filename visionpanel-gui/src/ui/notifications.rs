//! Toast notifications and the modal confirmation prompt.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eframe::egui::{self, RichText, Rounding, Vec2};
use tokio::sync::oneshot;
use visionpanel_core::{NotificationSink, NotifyLevel};

use crate::ui::colors;

/// Most toasts shown at once; older ones are dropped first.
const MAX_TOASTS: usize = 5;

/// One on-screen notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub level: NotifyLevel,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

struct PendingConfirm {
    message: String,
    reply: oneshot::Sender<bool>,
}

/// Notification sink backed by egui toasts.
///
/// Backend tasks call into this from the runtime's threads, so all state sits
/// behind mutexes and every change asks egui for a repaint.
#[derive(Default)]
pub struct ToastCenter {
    toasts: Mutex<Vec<Toast>>,
    confirms: Mutex<VecDeque<PendingConfirm>>,
    ctx: Mutex<Option<egui::Context>>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the egui context so background notifications wake the UI.
    pub fn attach(&self, ctx: &egui::Context) {
        *self.ctx.lock().unwrap_or_else(|e| e.into_inner()) = Some(ctx.clone());
    }

    fn wake(&self) {
        if let Some(ctx) = self.ctx.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            ctx.request_repaint();
        }
    }

    /// Drop expired toasts and return the live ones, oldest first.
    pub fn live(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
        toasts.retain(|t| t.expires_at > now);
        toasts.clone()
    }

    /// Message of the confirmation awaiting an answer, if any.
    pub fn pending_confirm(&self) -> Option<String> {
        self.confirms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .front()
            .map(|c| c.message.clone())
    }

    pub fn is_confirming(&self) -> bool {
        self.pending_confirm().is_some()
    }

    /// Resolve the front confirmation.
    pub fn answer(&self, confirmed: bool) {
        let pending = self
            .confirms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(pending) = pending {
            let _ = pending.reply.send(confirmed);
        }
        self.wake();
    }
}

#[async_trait]
impl NotificationSink for ToastCenter {
    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration) {
        let ttl = chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::seconds(3));
        {
            let mut toasts = self.toasts.lock().unwrap_or_else(|e| e.into_inner());
            toasts.push(Toast {
                level,
                message: message.to_string(),
                expires_at: Utc::now() + ttl,
            });
            let overflow = toasts.len().saturating_sub(MAX_TOASTS);
            toasts.drain(..overflow);
        }
        self.wake();
    }

    async fn confirm(&self, message: &str) -> bool {
        let (tx, rx) = oneshot::channel();
        self.confirms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(PendingConfirm {
                message: message.to_string(),
                reply: tx,
            });
        self.wake();
        rx.await.unwrap_or(false)
    }
}

/// Render toasts in the bottom-right corner and the confirmation modal.
pub fn render(center: &ToastCenter, ctx: &egui::Context) {
    let toasts = center.live(Utc::now());
    if !toasts.is_empty() {
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, Vec2::new(-12.0, -36.0))
            .order(egui::Order::Foreground)
            .interactable(false)
            .show(ctx, |ui| {
                for toast in &toasts {
                    let accent = colors::level(toast.level);
                    egui::Frame::none()
                        .fill(colors::panel_bg(ui.visuals()))
                        .stroke(egui::Stroke::new(1.0, accent))
                        .rounding(Rounding::same(8.0))
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .show(ui, |ui| {
                            ui.set_max_width(320.0);
                            ui.label(RichText::new(&toast.message).color(accent));
                        });
                    ui.add_space(6.0);
                }
            });
    }

    if let Some(message) = center.pending_confirm() {
        egui::Window::new("Please confirm")
            .collapsible(false)
            .resizable(false)
            .default_width(360.0)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing = Vec2::new(8.0, 12.0);
                ui.label(&message);
                ui.separator();
                ui.horizontal(|ui| {
                    if ui
                        .add_sized(
                            Vec2::new(100.0, 30.0),
                            egui::Button::new(RichText::new("Confirm").strong())
                                .fill(colors::ERROR)
                                .rounding(Rounding::same(8.0)),
                        )
                        .clicked()
                    {
                        center.answer(true);
                    }
                    if ui
                        .add_sized(
                            Vec2::new(100.0, 30.0),
                            egui::Button::new("Cancel").rounding(Rounding::same(8.0)),
                        )
                        .clicked()
                    {
                        center.answer(false);
                    }
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_toasts_expire() {
        let center = ToastCenter::new();
        center.notify(NotifyLevel::Info, "short", Duration::from_secs(1));
        center.notify(NotifyLevel::Error, "long", Duration::from_secs(8));

        assert_eq!(center.live(Utc::now()).len(), 2);
        let later = Utc::now() + chrono::Duration::seconds(2);
        let live = center.live(later);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].message, "long");
    }

    #[test]
    fn test_toast_stack_is_bounded() {
        let center = ToastCenter::new();
        for i in 0..8 {
            center.notify(NotifyLevel::Info, &format!("n{i}"), Duration::from_secs(5));
        }
        let live = center.live(Utc::now());
        assert_eq!(live.len(), MAX_TOASTS);
        assert_eq!(live[0].message, "n3");
    }

    #[tokio::test]
    async fn test_confirm_resolves_with_answer() {
        let center = Arc::new(ToastCenter::new());
        let asking = {
            let center = Arc::clone(&center);
            tokio::spawn(async move { center.confirm("Delete \"Alpha\"?").await })
        };

        while !center.is_confirming() {
            tokio::task::yield_now().await;
        }
        assert_eq!(center.pending_confirm().as_deref(), Some("Delete \"Alpha\"?"));
        center.answer(true);

        assert!(asking.await.unwrap());
        assert!(!center.is_confirming());
    }

    #[tokio::test]
    async fn test_abandoned_confirm_is_false() {
        let center = Arc::new(ToastCenter::new());
        let asking = {
            let center = Arc::clone(&center);
            tokio::spawn(async move { center.confirm("Proceed?").await })
        };
        while !center.is_confirming() {
            tokio::task::yield_now().await;
        }
        center.confirms.lock().unwrap().clear();

        assert!(!asking.await.unwrap());
    }
}
