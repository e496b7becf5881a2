//! Model registry view-model.
//!
//! Holds the model set last reported by the backend and the current
//! selection. The set is only ever replaced wholesale with a fresh listing;
//! imports and deletes go through the backend and are followed by a refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::types::{ModelEntry, ModelMap, ModelUpload};
use crate::gateway::{BackendGateway, GatewayError};
use crate::notify::{NotificationSink, NotifyLevel, DEFAULT_NOTIFY_DURATION};
use crate::task::{drain_ready, PendingTask, TaskPoll};

const UPLOAD_START_DURATION: Duration = Duration::from_secs(2);
const UPLOAD_FAILED_DURATION: Duration = Duration::from_secs(5);

/// Outcome of a delete round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteOutcome {
    Declined,
    Deleted,
    Failed,
}

/// Known models plus the selector state.
pub struct ModelRegistry {
    models: ModelMap,
    selected: Option<String>,
    importing: Option<String>,
    gateway: Arc<dyn BackendGateway>,
    sink: Arc<dyn NotificationSink>,
    runtime: Handle,
    refreshes: Vec<PendingTask<Result<ModelMap, GatewayError>>>,
    import_task: Option<PendingTask<bool>>,
    deletes: Vec<PendingTask<DeleteOutcome>>,
}

impl ModelRegistry {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        sink: Arc<dyn NotificationSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            models: ModelMap::new(),
            selected: None,
            importing: None,
            gateway,
            sink,
            runtime,
            refreshes: Vec::new(),
            import_task: None,
            deletes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ModelEntry)> {
        self.models.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Display name for `model_id`, falling back to the id itself.
    pub fn name_of<'a>(&'a self, model_id: &'a str) -> &'a str {
        self.models
            .get(model_id)
            .map(|entry| entry.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(model_id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// File name of the upload in flight, if any.
    pub fn importing(&self) -> Option<&str> {
        self.importing.as_deref()
    }

    /// True while any registry round-trip is outstanding.
    pub fn is_busy(&self) -> bool {
        !self.refreshes.is_empty() || self.import_task.is_some() || !self.deletes.is_empty()
    }

    /// User selection. Returns `true` when the selection changed; unknown ids
    /// are refused.
    #[must_use]
    pub fn select(&mut self, model_id: &str) -> bool {
        if !self.contains(model_id) {
            debug!(model = %model_id, "Ignoring selection of unknown model");
            return false;
        }
        if self.selected.as_deref() == Some(model_id) {
            return false;
        }
        self.selected = Some(model_id.to_string());
        true
    }

    /// Select the model named by a loaded configuration, if it is known.
    pub fn apply_loaded(&mut self, model_id: &str) {
        if self.contains(model_id) {
            self.selected = Some(model_id.to_string());
        } else {
            debug!(model = %model_id, "Loaded model is not in the registry");
        }
    }

    /// Replace the model set, keeping the selection when it still exists and
    /// otherwise falling back to the first model.
    pub fn apply_models(&mut self, models: ModelMap) {
        self.models = models;

        let keep = self
            .selected
            .as_deref()
            .is_some_and(|id| self.models.contains_key(id));
        if !keep {
            self.selected = self.models.keys().next().cloned();
        }

        debug!(
            total_models = self.models.len(),
            selected = ?self.selected,
            "Model registry replaced"
        );
    }

    /// Re-fetch the full model set from the backend.
    pub fn refresh(&mut self) {
        let gateway = Arc::clone(&self.gateway);
        self.refreshes.push(PendingTask::spawn(&self.runtime, async move {
            gateway.list_models().await
        }));
    }

    /// Upload a model file. Refused while another upload is in flight.
    pub fn import(&mut self, upload: ModelUpload) {
        if let Some(current) = &self.importing {
            debug!(current = %current, requested = %upload.file_name, "Upload already in flight");
            return;
        }

        self.sink.notify(
            NotifyLevel::Info,
            &format!("Uploading model \"{}\"...", upload.file_name),
            UPLOAD_START_DURATION,
        );
        self.importing = Some(upload.file_name.clone());

        let gateway = Arc::clone(&self.gateway);
        let sink = Arc::clone(&self.sink);
        self.import_task = Some(PendingTask::spawn(&self.runtime, async move {
            let file_name = upload.file_name.clone();
            match gateway.upload_model(upload).await {
                Ok(()) => {
                    info!(file = %file_name, "Model uploaded");
                    sink.notify(NotifyLevel::Success, "Model uploaded.", DEFAULT_NOTIFY_DURATION);
                    true
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Model upload failed");
                    sink.notify(
                        NotifyLevel::Error,
                        &format!("Model upload failed: {}", e.user_message()),
                        UPLOAD_FAILED_DURATION,
                    );
                    false
                }
            }
        }));
    }

    /// Delete a model after the user confirms. A declined prompt does nothing.
    pub fn delete(&mut self, model_id: &str) {
        let name = self.name_of(model_id).to_string();
        let model_id = model_id.to_string();
        let gateway = Arc::clone(&self.gateway);
        let sink = Arc::clone(&self.sink);

        self.deletes.push(PendingTask::spawn(&self.runtime, async move {
            let prompt =
                format!("Permanently delete model \"{name}\"? This cannot be undone.");
            if !sink.confirm(&prompt).await {
                debug!(model = %model_id, "Model deletion declined");
                return DeleteOutcome::Declined;
            }

            match gateway.delete_model(&model_id).await {
                Ok(()) => {
                    info!(model = %model_id, "Model deleted");
                    sink.notify(NotifyLevel::Success, "Model deleted.", DEFAULT_NOTIFY_DURATION);
                    DeleteOutcome::Deleted
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "Model delete failed");
                    sink.notify(
                        NotifyLevel::Error,
                        &format!("Delete failed: {}", e.user_message()),
                        DEFAULT_NOTIFY_DURATION,
                    );
                    DeleteOutcome::Failed
                }
            }
        }));
    }

    /// Apply finished round-trips. Call once per frame.
    pub fn poll(&mut self) {
        for result in drain_ready(&mut self.refreshes, "model refresh") {
            match result {
                Ok(models) => self.apply_models(models),
                Err(e) => {
                    warn!(error = %e, "Failed to load models");
                    self.sink.notify(
                        NotifyLevel::Error,
                        &format!("Failed to load models: {}", e.user_message()),
                        DEFAULT_NOTIFY_DURATION,
                    );
                }
            }
        }

        if let Some(task) = self.import_task.as_mut() {
            match task.poll() {
                TaskPoll::Pending => {}
                TaskPoll::Ready(uploaded) => {
                    self.import_task = None;
                    self.importing = None;
                    if uploaded {
                        self.refresh();
                    }
                }
                TaskPoll::Lost => {
                    warn!("Model upload task ended without a result");
                    self.import_task = None;
                    self.importing = None;
                }
            }
        }

        // Any confirmed delete re-fetches, successful or not
        let deleted = drain_ready(&mut self.deletes, "model delete");
        if deleted.iter().any(|outcome| *outcome != DeleteOutcome::Declined) {
            self.refresh();
        }
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.models)
            .field("selected", &self.selected)
            .field("importing", &self.importing)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingSink, ScriptedGateway};

    fn registry(gateway: &Arc<ScriptedGateway>, sink: &Arc<RecordingSink>) -> ModelRegistry {
        ModelRegistry::new(gateway.clone(), sink.clone(), Handle::current())
    }

    async fn settle(registry: &mut ModelRegistry) {
        for _ in 0..200 {
            registry.poll();
            if !registry.is_busy() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("registry did not settle");
    }

    fn map(entries: &[(&str, &str)]) -> ModelMap {
        entries
            .iter()
            .map(|(id, name)| (id.to_string(), ModelEntry::new(*name, "1.00 MB")))
            .collect()
    }

    #[tokio::test]
    async fn test_refresh_selects_first_when_nothing_selected() {
        let gateway = Arc::new(ScriptedGateway::with_models(&[
            ("b.onnx", "b"),
            ("a.pt", "a"),
        ]));
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.refresh();
        settle(&mut reg).await;

        assert_eq!(reg.len(), 2);
        assert_eq!(reg.selected(), Some("a.pt"));
    }

    #[tokio::test]
    async fn test_apply_models_keeps_or_falls_back() {
        let gateway = Arc::new(ScriptedGateway::new());
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.apply_models(map(&[("a", "A"), ("b", "B")]));
        assert!(reg.select("b"));
        assert!(!reg.select("b"), "same selection is not a change");

        reg.apply_models(map(&[("a", "A"), ("b", "B"), ("c", "C")]));
        assert_eq!(reg.selected(), Some("b"));

        reg.apply_models(map(&[("c", "C")]));
        assert_eq!(reg.selected(), Some("c"));

        reg.apply_models(ModelMap::new());
        assert_eq!(reg.selected(), None);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_selectable() {
        let gateway = Arc::new(ScriptedGateway::new());
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);
        reg.apply_models(map(&[("a", "A")]));

        assert!(!reg.select("stale.pt"));
        reg.apply_loaded("stale.pt");
        assert_eq!(reg.selected(), Some("a"));
        assert_eq!(reg.name_of("stale.pt"), "stale.pt");
        assert_eq!(reg.name_of("a"), "A");
    }

    #[tokio::test]
    async fn test_refresh_failure_notifies() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail("list_models", "disk unavailable");
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.refresh();
        settle(&mut reg).await;

        assert!(sink.has(NotifyLevel::Error, "Failed to load models: disk unavailable"));
    }

    #[tokio::test]
    async fn test_import_uploads_then_refreshes() {
        let gateway = Arc::new(ScriptedGateway::new());
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.import(ModelUpload::new("yolo.onnx", vec![1, 2, 3]));
        assert_eq!(reg.importing(), Some("yolo.onnx"));
        reg.import(ModelUpload::new("other.pt", vec![]));
        settle(&mut reg).await;

        assert_eq!(reg.importing(), None);
        assert_eq!(
            gateway.calls(),
            vec![Call::UploadModel("yolo.onnx".into()), Call::ListModels]
        );
        assert_eq!(reg.name_of("yolo.onnx"), "yolo");
        assert!(sink.has(NotifyLevel::Info, "Uploading model \"yolo.onnx\"..."));
        assert!(sink.has(NotifyLevel::Success, "Model uploaded."));
    }

    #[tokio::test]
    async fn test_import_failure_clears_staged_file() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.fail("upload_model", "Invalid file type");
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.import(ModelUpload::new("notes.txt", vec![]));
        settle(&mut reg).await;

        assert_eq!(reg.importing(), None);
        assert_eq!(gateway.count(|c| *c == Call::ListModels), 0);
        assert!(sink.has(
            NotifyLevel::Error,
            "Model upload failed: notes.txt: Invalid file type"
        ));
        assert!(sink.durations().contains(&UPLOAD_FAILED_DURATION));
    }

    #[tokio::test]
    async fn test_declined_delete_is_silent_noop() {
        let gateway = Arc::new(ScriptedGateway::with_models(&[("a", "Alpha")]));
        let sink = Arc::new(RecordingSink::new(false));
        let mut reg = registry(&gateway, &sink);
        reg.refresh();
        settle(&mut reg).await;

        reg.delete("a");
        settle(&mut reg).await;

        assert_eq!(sink.prompts().len(), 1);
        assert!(sink.prompts()[0].contains("Alpha"));
        assert_eq!(gateway.count(|c| matches!(c, Call::DeleteModel(_))), 0);
        assert_eq!(gateway.count(|c| *c == Call::ListModels), 1);
        assert!(reg.contains("a"));
        assert!(sink.notes().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_delete_refreshes() {
        let gateway = Arc::new(ScriptedGateway::with_models(&[("a", "Alpha"), ("b", "Beta")]));
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);
        reg.refresh();
        settle(&mut reg).await;

        reg.delete("a");
        settle(&mut reg).await;

        assert_eq!(
            gateway.calls(),
            vec![
                Call::ListModels,
                Call::DeleteModel("a".into()),
                Call::ListModels
            ]
        );
        assert!(!reg.contains("a"));
        assert_eq!(reg.selected(), Some("b"));
        assert!(sink.has(NotifyLevel::Success, "Model deleted."));
    }

    #[tokio::test]
    async fn test_failed_delete_reports() {
        let gateway = Arc::new(ScriptedGateway::with_models(&[("a", "Alpha")]));
        gateway.fail("delete_model", "File not found");
        let sink = Arc::new(RecordingSink::new(true));
        let mut reg = registry(&gateway, &sink);

        reg.delete("missing.pt");
        settle(&mut reg).await;

        assert!(sink.prompts()[0].contains("missing.pt"));
        assert!(sink.has(NotifyLevel::Error, "Delete failed: File not found"));
        assert_eq!(
            gateway.calls(),
            vec![Call::DeleteModel("missing.pt".into()), Call::ListModels]
        );
        assert!(reg.contains("a"));
    }
}
