use thiserror::Error;

/// Errors raised while compiling an expression tree into SQL.
#[derive(Debug, Error)]
pub enum SqlCompileError {
    #[error("Chain depth {depth} exceeds the configured maximum of {max}")]
    ChainTooDeep { depth: usize, max: usize },

    #[error("Chained search starts at {found} but the enclosing search is over {expected}")]
    ChainTypeMismatch { expected: String, found: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid search value: {0}")]
    InvalidValue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlCompileError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error was caused by the search request rather than by
    /// the compiler's configuration.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ChainTooDeep { .. }
                | Self::ChainTypeMismatch { .. }
                | Self::InvalidIdentifier(_)
                | Self::InvalidValue(_)
        )
    }
}

/// Convenience result type for SQL compilation
pub type Result<T> = std::result::Result<T, SqlCompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = SqlCompileError::ChainTooDeep { depth: 5, max: 4 };
        assert_eq!(
            err.to_string(),
            "Chain depth 5 exceeds the configured maximum of 4"
        );
        assert!(err.is_client_error());

        let err = SqlCompileError::config("max_chain_depth must be at least 1");
        assert!(!err.is_client_error());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
