use keyframes_core::ModelError;
use thiserror::Error;

/// Everything that can go wrong between a JSON document and a ready [`Animation`](keyframes_core::Animation).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read animation: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed animation JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid animation: {0}")]
    Model(#[from] ModelError),
}
