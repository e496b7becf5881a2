//! REST gateway to the inference backend.
//!
//! All endpoints live under `{base_url}/api`. Error bodies look like
//! `{"error": "..."}` or `{"status": "error", "message": "..."}`; a 204 or an
//! empty body counts as a bare success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, RequestBuilder, StatusCode, Url};
use tracing::{debug, error, warn};

use super::{BackendGateway, GatewayError};
use crate::config::PanelSettings;
use crate::configuration::{Configuration, PartialConfiguration};
use crate::models::{ModelMap, ModelUpload};

const API_PREFIX: &str = "/api";

/// Multipart field the backend reads the model file from.
const UPLOAD_FIELD: &str = "model";

/// Backend gateway speaking the panel's REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for `base_url` (e.g. `http://127.0.0.1:8000`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &PanelSettings) -> Result<Self, GatewayError> {
        Self::new(settings.backend_url.clone(), settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// URL of a single model, with the id percent-encoded as one path segment.
    fn model_url(&self, model_id: &str) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&self.endpoint("/models"))
            .map_err(|e| GatewayError::Transport(format!("Invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Transport("Invalid backend URL".to_string()))?
            .push(model_id);
        Ok(url)
    }

    /// Send a request and decode its JSON body, if any.
    async fn send(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        let response = request.send().await.map_err(|e| {
            warn!(call = what, error = %e, "Backend request failed");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = status_error_message(status.as_u16(), &body);
            error!(call = what, status = status.as_u16(), %message, "Backend returned an error");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(call = what, status = status.as_u16(), bytes = body.len(), "Backend call succeeded");

        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Message for a failed response: the body's `error` or `message` field when
/// present, otherwise a generic one built from the status code.
pub fn status_error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"].into_iter().find_map(|field| {
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn load_config(&self) -> Result<PartialConfiguration, GatewayError> {
        let body = self
            .send(self.client.get(self.endpoint("/config")), "load_config")
            .await?;
        match body {
            Some(value) => {
                serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
            }
            None => Ok(PartialConfiguration::default()),
        }
    }

    async fn save_config(&self, config: &Configuration) -> Result<(), GatewayError> {
        self.send(
            self.client.post(self.endpoint("/config")).json(config),
            "save_config",
        )
        .await?;
        Ok(())
    }

    async fn list_models(&self) -> Result<ModelMap, GatewayError> {
        let body = self
            .send(self.client.get(self.endpoint("/models")), "list_models")
            .await?;
        match body {
            Some(value) => {
                serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
            }
            None => Ok(ModelMap::new()),
        }
    }

    async fn upload_model(&self, upload: ModelUpload) -> Result<(), GatewayError> {
        let ModelUpload { file_name, bytes } = upload;

        let part = multipart::Part::bytes(bytes).file_name(file_name.clone());
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        self.send(
            self.client.post(self.endpoint("/models")).multipart(form),
            "upload_model",
        )
        .await
        .map_err(|e| e.for_upload(&file_name))?;
        Ok(())
    }

    async fn delete_model(&self, model_id: &str) -> Result<(), GatewayError> {
        let url = self.model_url(model_id)?;
        self.send(self.client.delete(url), "delete_model").await?;
        Ok(())
    }

    async fn start_inference(&self, config: &Configuration) -> Result<(), GatewayError> {
        self.send(
            self.client
                .post(self.endpoint("/inference/start"))
                .json(config),
            "start_inference",
        )
        .await?;
        Ok(())
    }

    async fn stop_inference(&self) -> Result<(), GatewayError> {
        self.send(
            self.client.post(self.endpoint("/inference/stop")),
            "stop_inference",
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpGateway {
        HttpGateway::new("http://127.0.0.1:8000/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_api_prefix() {
        let gw = gateway();
        assert_eq!(gw.base_url(), "http://127.0.0.1:8000");
        assert_eq!(gw.endpoint("/config"), "http://127.0.0.1:8000/api/config");
    }

    #[test]
    fn test_model_url_encodes_id() {
        let url = gateway().model_url("my model#1.onnx").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/models/my%20model%231.onnx"
        );
    }

    #[test]
    fn test_from_settings_uses_backend_url() {
        let settings = PanelSettings {
            backend_url: "http://10.1.1.1:9000".to_string(),
            ..Default::default()
        };
        let gw = HttpGateway::from_settings(&settings).unwrap();
        assert_eq!(gw.endpoint("/models"), "http://10.1.1.1:9000/api/models");
    }

    #[test]
    fn test_status_error_prefers_error_field() {
        let body = br#"{"error": "File not found"}"#;
        assert_eq!(status_error_message(404, body), "File not found");
    }

    #[test]
    fn test_status_error_falls_back_to_message_field() {
        let body = br#"{"status": "error", "message": "Inference already running."}"#;
        assert_eq!(status_error_message(409, body), "Inference already running.");
    }

    #[test]
    fn test_status_error_synthesizes_generic_message() {
        assert_eq!(
            status_error_message(500, b"<html>oops</html>"),
            "Request failed with status 500"
        );
        assert_eq!(status_error_message(502, b""), "Request failed with status 502");
        assert_eq!(
            status_error_message(400, br#"{"error": ""}"#),
            "Request failed with status 400"
        );
    }
}
