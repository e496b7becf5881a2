//! Scripted backend and notification fakes for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::configuration::{Configuration, PartialConfiguration};
use crate::gateway::{BackendGateway, GatewayError};
use crate::models::{ModelEntry, ModelMap, ModelUpload};
use crate::notify::{NotificationSink, NotifyLevel};

/// A backend call as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    LoadConfig,
    SaveConfig(Configuration),
    ListModels,
    UploadModel(String),
    DeleteModel(String),
    StartInference(Configuration),
    StopInference,
}

/// In-memory backend that records calls and fails on request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedGateway {
    calls: Mutex<Vec<Call>>,
    models: Mutex<ModelMap>,
    config: Mutex<PartialConfiguration>,
    failures: Mutex<HashMap<&'static str, String>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_models(models: &[(&str, &str)]) -> Self {
        let gateway = Self::new();
        {
            let mut map = gateway.models.lock().unwrap();
            for (id, name) in models {
                map.insert(id.to_string(), ModelEntry::new(*name, "1.00 MB"));
            }
        }
        gateway
    }

    pub(crate) fn set_config(&self, config: PartialConfiguration) {
        *self.config.lock().unwrap() = config;
    }

    /// Make every call to `op` fail with a status error carrying `message`.
    pub(crate) fn fail(&self, op: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, message.to_string());
    }

    pub(crate) fn heal(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub(crate) fn saved(&self) -> Vec<Configuration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Call::SaveConfig(config) => Some(config.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: &'static str, call: Call) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(op) {
            Some(message) => Err(GatewayError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    async fn load_config(&self) -> Result<PartialConfiguration, GatewayError> {
        self.record("load_config", Call::LoadConfig)?;
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save_config(&self, config: &Configuration) -> Result<(), GatewayError> {
        self.record("save_config", Call::SaveConfig(config.clone()))
    }

    async fn list_models(&self) -> Result<ModelMap, GatewayError> {
        self.record("list_models", Call::ListModels)?;
        Ok(self.models.lock().unwrap().clone())
    }

    async fn upload_model(&self, upload: ModelUpload) -> Result<(), GatewayError> {
        self.record("upload_model", Call::UploadModel(upload.file_name.clone()))
            .map_err(|e| e.for_upload(&upload.file_name))?;
        let stem = upload
            .file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| upload.file_name.clone());
        self.models
            .lock()
            .unwrap()
            .insert(upload.file_name, ModelEntry::new(stem, "1.00 MB"));
        Ok(())
    }

    async fn delete_model(&self, model_id: &str) -> Result<(), GatewayError> {
        self.record("delete_model", Call::DeleteModel(model_id.to_string()))?;
        self.models.lock().unwrap().remove(model_id);
        Ok(())
    }

    async fn start_inference(&self, config: &Configuration) -> Result<(), GatewayError> {
        self.record("start_inference", Call::StartInference(config.clone()))
    }

    async fn stop_inference(&self) -> Result<(), GatewayError> {
        self.record("stop_inference", Call::StopInference)
    }
}

/// Sink that records notifications and answers confirmations with a preset.
#[derive(Debug)]
pub(crate) struct RecordingSink {
    notes: Mutex<Vec<(NotifyLevel, String, Duration)>>,
    prompts: Mutex<Vec<String>>,
    answer: AtomicBool,
}

impl RecordingSink {
    pub(crate) fn new(answer: bool) -> Self {
        Self {
            notes: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            answer: AtomicBool::new(answer),
        }
    }

    pub(crate) fn notes(&self) -> Vec<(NotifyLevel, String)> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .map(|(level, message, _)| (*level, message.clone()))
            .collect()
    }

    pub(crate) fn durations(&self) -> Vec<Duration> {
        self.notes.lock().unwrap().iter().map(|n| n.2).collect()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn has(&self, level: NotifyLevel, fragment: &str) -> bool {
        self.notes()
            .iter()
            .any(|(l, message)| *l == level && message.contains(fragment))
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn notify(&self, level: NotifyLevel, message: &str, duration: Duration) {
        self.notes
            .lock()
            .unwrap()
            .push((level, message.to_string(), duration));
    }

    async fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.answer.load(Ordering::SeqCst)
    }
}
