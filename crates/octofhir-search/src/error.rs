use thiserror::Error;

/// Errors raised while constructing search expressions.
///
/// Construction is atomic: a factory call either returns a complete node or
/// one of these errors, never a partially built tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ExpressionError {
    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Construction errors are always caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument(_) => ErrorCategory::Validation,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for expression construction
pub type Result<T> = std::result::Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_message() {
        let err = ExpressionError::invalid_argument("expressions must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid argument: expressions must not be empty"
        );
        assert!(err.is_client_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.category().to_string(), "validation");
    }
}
