//! Error types for the thememiner library.
//!
//! Every fallible operation in the crate returns [`ThememinerError`]. The batch
//! pipeline folds the per-item variants ([`FailureKind`]) into "not completed this
//! run" instead of aborting, so the taxonomy here doubles as the failure report.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::RecordId;

/// Main result type for thememiner operations.
pub type Result<T> = std::result::Result<T, ThememinerError>;

/// Comprehensive error type for all thememiner operations.
#[derive(Error, Debug)]
pub enum ThememinerError {
    /// I/O related errors (log files, archives, config files)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The text source has no record for the identifier
    #[error("Record {id} not found")]
    NotFound {
        /// Identifier that was looked up
        id: RecordId,
    },

    /// The classification provider failed
    #[error("Service error ({}): {message}", transience_label(.transient))]
    Service {
        /// Error description
        message: String,
        /// Whether a later attempt may succeed
        transient: bool,
        /// HTTP status, when the failure came from a response
        status: Option<u16>,
    },

    /// The provider answered with data that does not match the expected shape
    #[error("Malformed result: {message}")]
    MalformedResult {
        /// Error description
        message: String,
        /// Raw completion text, kept for debugging
        raw: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Batch pipeline errors outside the per-item boundary
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

/// Failure classes reported per item by the batch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Text source lookup failed
    NotFound,
    /// Provider failure that may succeed on retry
    ServiceTransient,
    /// Provider failure that will not succeed on retry
    ServicePermanent,
    /// Provider output did not match the expected shape
    MalformedResult,
    /// Anything else (I/O while appending, serialization)
    Internal,
}

impl FailureKind {
    /// Short label used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ServiceTransient => "service_transient",
            Self::ServicePermanent => "service_permanent",
            Self::MalformedResult => "malformed_result",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ThememinerError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a not-found error for a record identifier
    pub fn not_found(id: RecordId) -> Self {
        Self::NotFound { id }
    }

    /// Create a retryable provider error
    pub fn service_transient(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            transient: true,
            status: None,
        }
    }

    /// Create a non-retryable provider error
    pub fn service_permanent(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            transient: false,
            status: None,
        }
    }

    /// Create a provider error from an HTTP status code
    pub fn service_status(status: u16, message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
            transient: is_transient_status(status),
            status: Some(status),
        }
    }

    /// Create a malformed-result error, keeping the raw completion
    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResult {
            message: message.into(),
            raw: Some(raw.into()),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map this error onto the per-item failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Service {
                transient: true, ..
            } => FailureKind::ServiceTransient,
            Self::Service {
                transient: false, ..
            } => FailureKind::ServicePermanent,
            Self::MalformedResult { .. } => FailureKind::MalformedResult,
            _ => FailureKind::Internal,
        }
    }

    /// Whether an automatic retry may help.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Service {
                transient: true,
                ..
            }
        )
    }
}

fn transience_label(transient: &bool) -> &'static str {
    if *transient {
        "transient"
    } else {
        "permanent"
    }
}

/// HTTP statuses worth retrying: request timeout, rate limiting and server errors.
pub fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

impl From<io::Error> for ThememinerError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for ThememinerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ThememinerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for ThememinerError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let transient = match status {
            Some(code) => is_transient_status(code),
            None => err.is_timeout() || err.is_connect(),
        };
        Self::Service {
            message: format!("HTTP request failed: {err}"),
            transient,
            status,
        }
    }
}

/// Shorthand conversions for foreign errors that carry no thememiner context.
pub trait ThememinerResultExt<T> {
    /// Convert any displayable error into an internal error describing the operation.
    fn map_generic_err(self, operation: &str) -> Result<T>;

    /// Convert a JSON decoding error into a serialization error naming the payload.
    fn map_json_err(self, what: &str) -> Result<T>;
}

impl<T, E> ThememinerResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn map_generic_err(self, operation: &str) -> Result<T> {
        self.map_err(|e| ThememinerError::internal(format!("Failed {operation}: {e}")))
    }

    fn map_json_err(self, what: &str) -> Result<T> {
        self.map_err(|e| ThememinerError::Serialization {
            message: format!("Failed to decode {what}: {e}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ThememinerError::validation_field("must be positive", "pipeline.concurrency");
        assert!(matches!(err, ThememinerError::Validation { field: Some(_), .. }));

        let err = ThememinerError::not_found(RecordId(7));
        assert!(matches!(err, ThememinerError::NotFound { id } if id == RecordId(7)));
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            ThememinerError::not_found(RecordId(1)).kind(),
            FailureKind::NotFound
        );
        assert_eq!(
            ThememinerError::service_transient("rate limited").kind(),
            FailureKind::ServiceTransient
        );
        assert_eq!(
            ThememinerError::service_permanent("bad key").kind(),
            FailureKind::ServicePermanent
        );
        assert_eq!(
            ThememinerError::malformed("not json", "{").kind(),
            FailureKind::MalformedResult
        );
        assert_eq!(
            ThememinerError::internal("boom").kind(),
            FailureKind::Internal
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(ThememinerError::service_status(429, "slow down").is_transient());
        assert!(ThememinerError::service_status(503, "unavailable").is_transient());
        assert!(ThememinerError::service_status(408, "timeout").is_transient());
        assert!(!ThememinerError::service_status(401, "unauthorized").is_transient());
        assert!(!ThememinerError::service_status(400, "bad request").is_transient());
    }

    #[test]
    fn test_service_display_mentions_transience() {
        let display = format!("{}", ThememinerError::service_transient("overloaded"));
        assert!(display.contains("transient"));
        assert!(display.contains("overloaded"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let err: ThememinerError = json_err.into();

        if let ThememinerError::Serialization { data_type, .. } = err {
            assert_eq!(data_type, Some("JSON".to_string()));
        } else {
            panic!("Expected Serialization error");
        }
    }

    #[test]
    fn test_map_json_err_names_payload() {
        let result: std::result::Result<i32, serde_json::Error> = serde_json::from_str("{");
        let err = result.map_json_err("theme completion").unwrap_err();
        assert!(format!("{err}").contains("theme completion"));
    }

    #[test]
    fn test_map_generic_err_is_internal() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "tls backend"));
        let err = result.map_generic_err("building HTTP client").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Internal);
        assert!(format!("{err}").contains("building HTTP client"));
    }
}
