use serde::Serialize;
use std::fmt;

/// Structured error type shared by the board, the generation service and the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error codes for categorizing different error types
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    MissingApiKey,
    ConfigError,

    // Generation service errors
    GenerationFailed,
    ParseError,
    ServiceUnavailable,

    // Board errors
    CardNotFound,
    InvalidParams,

    // Generic
    Unknown,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{:?}: {} - {}", self.code, self.message, details)
        } else {
            write!(f, "{:?}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        serde_json::to_string(&err).unwrap_or_else(|_| err.message)
    }
}

// Convenience constructors
impl AppError {
    pub fn missing_api_key() -> Self {
        Self {
            code: ErrorCode::MissingApiKey,
            message: "Gemini API key is not configured.".to_string(),
            details: None,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ConfigError,
            message: msg.into(),
            details: None,
        }
    }

    pub fn generation_failed(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::GenerationFailed,
            message: msg.into(),
            details: None,
        }
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ParseError,
            message: msg.into(),
            details: None,
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ServiceUnavailable,
            message: "Generation service unavailable".to_string(),
            details: Some(msg.into()),
        }
    }

    pub fn card_not_found(card_id: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::CardNotFound,
            message: "Card not found".to_string(),
            details: Some(card_id.into()),
        }
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidParams,
            message: "Invalid parameters".to_string(),
            details: Some(msg.into()),
        }
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Unknown,
            message: msg.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// Conversions from common error types
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::config(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_error(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(format!("Failed to parse config YAML: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::service_unavailable(err.to_string())
        } else if err.is_decode() {
            Self::parse_error(format!("Failed to decode response: {}", err))
        } else {
            Self::generation_failed(format!("Request failed: {}", err))
        }
    }
}
