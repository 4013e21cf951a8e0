//! Infrastructure error types for the SSO broker.
//!
//! Business rejections (an unavailable app, an invalid token) are not errors:
//! they are returned as [`IssueOutcome`](crate::token::IssueOutcome) and
//! [`RedeemOutcome`](crate::token::RedeemOutcome) variants. `HandoffError`
//! only covers failures of the machinery underneath: storage, timeouts,
//! configuration.

use std::fmt;

/// Errors that can occur while issuing or redeeming SSO tokens.
///
/// Every variant is a server-side failure. None of them may be reported to a
/// caller as "invalid token" or "app unavailable".
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// The token store failed (connection lost, query error, ...).
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// A store operation did not finish within the configured timeout.
    #[error("Storage operation timed out: {operation}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: String,
    },

    /// The generated token string already exists in the store.
    ///
    /// The uniqueness constraint rejected the insert; nothing was overwritten.
    #[error("Token collision")]
    TokenCollision,

    /// The broker configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl HandoffError {
    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Timeout { .. } | Self::TokenCollision
        )
    }

    /// Returns `true` if this error means a backing service is unavailable
    /// (503 equivalent) rather than a bug or misconfiguration (500).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.is_retryable()
    }

    /// Returns `true` if this error points at the broker itself (bad
    /// configuration or a bug) rather than at a backing service.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Internal { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Timeout { .. } => ErrorCategory::Infrastructure,
            Self::TokenCollision => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of broker errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HandoffError::storage("connection refused");
        assert_eq!(err.to_string(), "Storage error: connection refused");

        let err = HandoffError::timeout("consume");
        assert_eq!(err.to_string(), "Storage operation timed out: consume");

        assert_eq!(HandoffError::TokenCollision.to_string(), "Token collision");
    }

    #[test]
    fn test_error_retryable() {
        assert!(HandoffError::storage("down").is_retryable());
        assert!(HandoffError::timeout("create").is_retryable());
        assert!(HandoffError::TokenCollision.is_retryable());
        assert!(!HandoffError::configuration("bad ttl").is_retryable());
        assert!(!HandoffError::internal("bug").is_transient());
        assert!(HandoffError::internal("bug").is_server_error());
        assert!(!HandoffError::timeout("consume").is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            HandoffError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            HandoffError::TokenCollision.category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            HandoffError::configuration("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            HandoffError::internal("x").category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
        assert_eq!(ErrorCategory::Internal.to_string(), "internal");
    }
}
