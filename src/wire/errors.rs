use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("Wire error: {0}")]
    Json(#[from] serde_json::Error)
}
