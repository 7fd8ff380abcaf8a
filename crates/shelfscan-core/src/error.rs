//! Error types shared across the crate.
//!
//! Errors serialize to `{"code": "...", "message": "..."}` so a frontend can
//! match on the `code` field without parsing messages.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the recognition pipeline.
///
/// Two failure categories matter to callers: `transport` means the service
/// could not be reached (retrying the same input may succeed), `service`
/// means the service was reached and rejected or failed the request.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ScanError {
    // Local validation errors - raised before any network call
    #[error("{message}")]
    UnsupportedType { message: String },
    #[error("{message}")]
    TooLarge { message: String },

    // Local state errors
    #[error("{message}")]
    Conflict { message: String },

    // Remote errors
    #[error("{message}")]
    Transport { message: String },
    #[error("{message}")]
    Service { message: String },

    // Unexpected local failures (image re-encode and the like)
    #[error("{message}")]
    Internal { message: String },
}

impl ScanError {
    pub fn unsupported_type() -> Self {
        Self::UnsupportedType {
            message: "Unsupported file format. Please choose a JPG, PNG, GIF or WEBP image."
                .to_string(),
        }
    }

    pub fn unsupported_type_with(message: impl Into<String>) -> Self {
        Self::UnsupportedType {
            message: message.into(),
        }
    }

    pub fn too_large() -> Self {
        Self::TooLarge {
            message: "File too large. Please choose an image smaller than 10MB.".to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for network-level failures (could not reach the service).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// True for failures the service itself reported.
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service { .. })
    }
}

/// Result type alias used throughout the crate.
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_code_tag() {
        let err = ScanError::transport("connection refused");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "transport");
        assert_eq!(json["message"], "connection refused");
    }

    #[test]
    fn categories_are_distinguishable() {
        assert!(ScanError::transport("timeout").is_transport());
        assert!(!ScanError::transport("timeout").is_service());
        assert!(ScanError::service("rejected").is_service());
        assert!(!ScanError::service("rejected").is_transport());
    }
}
