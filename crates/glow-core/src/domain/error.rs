//! Error taxonomy for external calls, response parsing and the public surface.

use thiserror::Error;

use super::{Angle, ValidationVerdict};

/// Failure of a call to an external service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Retryable failure: timeouts, connection errors, 5xx, 408 and 429.
    #[error("transient service error{}: {message}", status_suffix(.status))]
    Transient {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Human-readable cause.
        message: String,
    },
    /// Non-retryable failure: other 4xx, malformed responses, missing credentials.
    #[error("permanent service error{}: {message}", status_suffix(.status))]
    Permanent {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Human-readable cause.
        message: String,
    },
    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl ServiceError {
    /// Classifies a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if is_retryable_status(status) {
            Self::Transient {
                status: Some(status),
                message,
            }
        } else {
            Self::Permanent {
                status: Some(status),
                message,
            }
        }
    }

    /// A timed-out attempt.
    #[must_use]
    pub fn timeout(what: &str) -> Self {
        Self::Transient {
            status: None,
            message: format!("{what} timed out"),
        }
    }

    /// A permanent failure without an HTTP status.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            status: None,
            message: message.into(),
        }
    }

    /// A transient failure without an HTTP status.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            status: None,
            message: message.into(),
        }
    }

    /// True if the failure may succeed on a later attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// HTTP status of the failed call, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Transient { status, .. } | Self::Permanent { status, .. } => *status,
            Self::Cancelled => None,
        }
    }
}

/// Statuses worth retrying: server errors, request timeout and rate limiting.
#[must_use]
pub const fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Malformed generative output that survived every repair stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No `{ ... }` span in the text.
    #[error("no JSON object found in response")]
    NoJson,
    /// JSON syntax error after repair.
    #[error("malformed JSON: {0}")]
    Syntax(String),
    /// Valid JSON that is not an assessment.
    #[error("assessment schema mismatch: {0}")]
    Schema(String),
}

/// Errors surfaced by [`crate::AnalysisPipeline::analyze`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The mandatory front photo failed validation. The user should retake it.
    #[error("no usable face in the {} photo: {}", .0.angle, .0)]
    FaceNotDetected(ValidationVerdict),
    /// A photo could not be read or encoded.
    #[error("could not read the {angle} photo: {reason}")]
    InvalidImage {
        /// Angle of the unreadable photo.
        angle: Angle,
        /// Cause.
        reason: String,
    },
    /// Infrastructure is unreachable (for example no network for detection).
    #[error("analysis unavailable: {0}")]
    AnalysisUnavailable(#[source] ServiceError),
    /// The caller cancelled the run.
    #[error("analysis cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ServiceError::from_status(500, "boom").is_retryable());
        assert!(ServiceError::from_status(503, "busy").is_retryable());
        assert!(ServiceError::from_status(429, "slow down").is_retryable());
        assert!(ServiceError::from_status(408, "timeout").is_retryable());
        assert!(!ServiceError::from_status(400, "bad").is_retryable());
        assert!(!ServiceError::from_status(401, "auth").is_retryable());
        assert!(!ServiceError::from_status(404, "missing").is_retryable());
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = ServiceError::timeout("face detection");
        assert!(err.is_retryable());
        assert_eq!(err.status(), None);
        assert_eq!(
            err.to_string(),
            "transient service error: face detection timed out"
        );
    }

    #[test]
    fn test_display_includes_status() {
        let err = ServiceError::from_status(502, "bad gateway");
        assert_eq!(
            err.to_string(),
            "transient service error (HTTP 502): bad gateway"
        );
    }

    #[test]
    fn test_cancelled_not_retryable() {
        assert!(!ServiceError::Cancelled.is_retryable());
    }
}
