//! Crate-wide error type and the structured envelope returned to MCP callers.

use serde::{Deserialize, Serialize};

/// Errors that can occur while serving a TrainerCentral tool call
#[derive(Debug, thiserror::Error)]
pub enum TcError {
    /// Required configuration (credentials, domain, org) is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The OAuth token exchange or refresh failed
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
    },

    /// TrainerCentral answered with a non-2xx status (after the 401 retry)
    #[error("TrainerCentral API returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// TrainerCentral answered 2xx but the body was not what the tool needed
    #[error("Unexpected TrainerCentral response: {0}")]
    UnexpectedResponse(String),

    /// Transport failure talking to TrainerCentral or Zoho
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or invalid tool parameters
    #[error("Invalid parameters: {0}")]
    Validation(String),
}

/// Result alias used across the crate
pub type TcResult<T> = Result<T, TcError>;

/// Error category exposed to MCP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    AuthenticationError,
    UpstreamError,
    ValidationError,
}

/// Structured error payload: `{kind, message, upstream_status_code}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
    pub upstream_status_code: Option<u16>,
}

impl TcError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TcError::Validation(msg.into())
    }

    pub fn authentication(msg: impl Into<String>) -> Self {
        TcError::Authentication {
            message: msg.into(),
            status: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TcError::Configuration(_) => ErrorKind::ConfigurationError,
            TcError::Authentication { .. } => ErrorKind::AuthenticationError,
            TcError::Upstream { .. } | TcError::UnexpectedResponse(_) | TcError::Network(_) => {
                ErrorKind::UpstreamError
            }
            TcError::Validation(_) => ErrorKind::ValidationError,
        }
    }

    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            TcError::Upstream { status, .. } => Some(*status),
            TcError::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            kind: self.kind(),
            message: self.to_string(),
            upstream_status_code: self.upstream_status(),
        }
    }
}

impl From<reqwest::Error> for TcError {
    fn from(err: reqwest::Error) -> Self {
        TcError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TcError {
    fn from(err: serde_json::Error) -> Self {
        TcError::UnexpectedResponse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_carries_upstream_status() {
        let err = TcError::Upstream {
            status: 404,
            message: "course not found".to_string(),
        };
        let env = err.to_envelope();
        assert_eq!(env.kind, ErrorKind::UpstreamError);
        assert_eq!(env.upstream_status_code, Some(404));
        assert!(env.message.contains("course not found"));
    }

    #[test]
    fn test_envelope_serializes_snake_case_kind() {
        let env = TcError::validation("missing 'course_id'").to_envelope();
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["kind"], "validation_error");
        assert!(json["upstream_status_code"].is_null());
    }

    #[test]
    fn test_network_errors_are_upstream_kind() {
        let err = TcError::Network("connection refused".to_string());
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.upstream_status(), None);
    }
}
