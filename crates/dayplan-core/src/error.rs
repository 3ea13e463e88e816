//! DayPlan error types.

/// Errors surfaced by the planning pipeline and its stores.
///
/// Malformed task fields never show up here: they are replaced by
/// defaults during normalization.
#[derive(Debug, thiserror::Error)]
pub enum DayPlanError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DayPlanError>;
