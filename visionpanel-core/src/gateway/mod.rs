//! Backend gateway: the RPC boundary to the inference backend.
//!
//! This module provides:
//! - `BackendGateway` - async trait the controller talks to
//! - `GatewayError` - message-bearing failure of any call
//! - `HttpGateway` - REST implementation over reqwest

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::configuration::{Configuration, PartialConfiguration};
use crate::models::{ModelMap, ModelUpload};

pub use http::{status_error_message, HttpGateway};

/// Errors returned by backend calls. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never got a response (connection refused, timeout, ...).
    #[error("{0}")]
    Transport(String),
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The response body could not be understood.
    #[error("Invalid response from backend: {0}")]
    Decode(String),
    /// An upload failed; carries the file being sent.
    #[error("{file_name}: {source}")]
    Upload {
        file_name: String,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    /// Human-readable message for notifications.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Upload { source, .. } => source.status(),
            _ => None,
        }
    }

    pub(crate) fn for_upload(self, file_name: &str) -> Self {
        Self::Upload {
            file_name: file_name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Operations the backend offers. Every call may fail or be slow.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Load the persisted configuration; any field may be missing.
    async fn load_config(&self) -> Result<PartialConfiguration, GatewayError>;

    async fn save_config(&self, config: &Configuration) -> Result<(), GatewayError>;

    /// Full model set, keyed by model id.
    async fn list_models(&self) -> Result<ModelMap, GatewayError>;

    async fn upload_model(&self, upload: ModelUpload) -> Result<(), GatewayError>;

    async fn delete_model(&self, model_id: &str) -> Result<(), GatewayError>;

    async fn start_inference(&self, config: &Configuration) -> Result<(), GatewayError>;

    async fn stop_inference(&self) -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_includes_file_name() {
        let err = GatewayError::Status {
            status: 400,
            message: "No file selected".to_string(),
        }
        .for_upload("model.onnx");
        assert_eq!(err.user_message(), "model.onnx: No file selected");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.user_message(), "connection refused");
    }
}
