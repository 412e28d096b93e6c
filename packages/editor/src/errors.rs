//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Edit rejected: {0}")]
    Rejected(#[from] funnel_rules::Rejection),

    #[error("Model error: {0}")]
    Model(#[from] funnel_model::ModelError),

    #[error("Store error: {0}")]
    Store(#[from] crate::persistence::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
