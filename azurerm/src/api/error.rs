//! ARM API error type.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// An error response from Resource Manager, carrying the service's own
    /// error code ("ResourceNotFound", "Conflict", ...) when the body was
    /// parseable.
    #[error("API returned HTTP {status} ({code}): {message}")]
    Cloud {
        status: u16,
        code: String,
        message: String,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("throttled by the service, retry later")]
    RateLimited,

    #[error("service unavailable, retry later")]
    ServiceUnavailable,
}

impl ApiError {
    /// The `response.WasNotFound` check: a read of something that is gone.
    pub fn was_not_found(&self) -> bool {
        matches!(self, ApiError::Cloud { status: 404, .. })
    }

    pub fn was_conflict(&self) -> bool {
        matches!(self, ApiError::Cloud { status: 409, .. })
    }

    pub fn was_bad_request(&self) -> bool {
        matches!(self, ApiError::Cloud { status: 400, .. })
    }
}

/// ARM error bodies come in two shapes: `{"error": {"code": ..,
/// "message": ..}}` and, from a few older providers, the flattened
/// `{"code": .., "message": ..}`.
#[derive(Debug, Deserialize)]
pub(crate) struct CloudErrorEnvelope {
    pub error: Option<CloudErrorBody>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CloudErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl CloudErrorEnvelope {
    pub(crate) fn into_parts(self) -> (String, String) {
        match self.error {
            Some(body) => (
                body.code.unwrap_or_else(|| "UnknownError".to_string()),
                body.message.unwrap_or_default(),
            ),
            None => (
                self.code.unwrap_or_else(|| "UnknownError".to_string()),
                self.message.unwrap_or_default(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_body_parses() {
        let envelope: CloudErrorEnvelope = serde_json::from_str(
            r#"{"error":{"code":"ResourceNotFound","message":"the resource was not found"}}"#,
        )
        .unwrap();
        let (code, message) = envelope.into_parts();
        assert_eq!(code, "ResourceNotFound");
        assert_eq!(message, "the resource was not found");
    }

    #[test]
    fn flat_error_body_parses() {
        let envelope: CloudErrorEnvelope =
            serde_json::from_str(r#"{"code":"BadRequest","message":"nope"}"#).unwrap();
        let (code, message) = envelope.into_parts();
        assert_eq!(code, "BadRequest");
        assert_eq!(message, "nope");
    }

    #[test]
    fn not_found_helper_matches_404_only() {
        let err = ApiError::Cloud {
            status: 404,
            code: "ResourceNotFound".to_string(),
            message: String::new(),
        };
        assert!(err.was_not_found());

        let err = ApiError::Cloud {
            status: 403,
            code: "AuthorizationFailed".to_string(),
            message: String::new(),
        };
        assert!(!err.was_not_found());
    }
}
