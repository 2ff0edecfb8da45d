use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackstageError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A page operation failed and already raised a notice with this text.
    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

impl BackstageError {
    /// Message suitable for a user-facing notice.
    pub fn notice_text(&self) -> String {
        match self {
            BackstageError::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackstageError>;
