//! Model registry types.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// File extensions the backend accepts as model files.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pt", "onnx"];

/// One model known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ModelEntry {
    /// Display name (the file stem).
    #[serde(default)]
    pub name: String,
    /// Human-readable size, e.g. `"12.34 MB"`.
    #[serde(default)]
    pub size: String,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
        }
    }
}

/// Models keyed by id (the file name), in ascending id order.
pub type ModelMap = BTreeMap<String, ModelEntry>;

/// A model file staged for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ModelUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a model file from disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
            })?;
        let bytes = std::fs::read(path)?;
        Ok(Self { file_name, bytes })
    }
}

impl std::fmt::Debug for ModelUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Whether `path` has one of the accepted model extensions.
pub fn is_supported_model(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Size in megabytes with two decimals, as the backend reports it.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
