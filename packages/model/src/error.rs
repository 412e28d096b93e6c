//! Error types for the content model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Content must be a JSON object, got {0}")]
    ContentNotObject(String),
}

/// Result alias used across the model crate
pub type ModelResult<T> = Result<T, ModelError>;
