//! Error types for the voltcheck service

/// Errors that can occur in the voltcheck service
#[derive(Debug, thiserror::Error)]
pub enum VoltcheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Session {0} not found")]
    NotFound(u64),
}

/// Result type alias for voltcheck operations
pub type Result<T> = std::result::Result<T, VoltcheckError>;
