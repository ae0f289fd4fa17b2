//! Error types for the UN reports harvester

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The catalog answered, but not with a usable body
    #[error("Fetch failed: status {status_code}, body length {body_length}")]
    Fetch { status_code: u16, body_length: usize },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The fetched document cannot be read as a MARCXML collection
    #[error("Parse error: {reason}")]
    Parse { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Entity registry error: {0}")]
    Registry(String),
}

impl AppError {
    pub fn parse(reason: impl Into<String>) -> Self {
        AppError::Parse {
            reason: reason.into(),
        }
    }

    /// True for errors raised while talking to an upstream host
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, AppError::Fetch { .. } | AppError::Network(_))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(e: quick_xml::Error) -> Self {
        AppError::parse(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for AppError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        AppError::parse(format!("invalid attribute: {}", e))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
