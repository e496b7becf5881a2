//! Model registry.
//!
//! This module provides:
//! - `ModelEntry` / `ModelMap` - models as the backend lists them
//! - `ModelUpload` - a model file staged for upload
//! - `ModelRegistry` - selector view-model driving refresh, import and delete

mod registry;
mod types;

pub use registry::ModelRegistry;
pub use types::{
    format_size, is_supported_model, ModelEntry, ModelMap, ModelUpload, SUPPORTED_EXTENSIONS,
};
