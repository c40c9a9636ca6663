//! # Error Module
//!
//! Core domain errors for QuickCreate, defined with thiserror.

use thiserror::Error;

/// Core domain errors.
///
/// Errors raised while building or parsing domain values and configuration,
/// independent of storage.
#[derive(Debug, Error)]
pub enum CoreError {
    // === Value errors ===
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    // === Configuration errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Cannot parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type alias with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create an invalid value error
    pub fn invalid_value(field: &str, value: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Whether this error comes from configuration loading
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CoreError::Config(_) | CoreError::ConfigIo(_) | CoreError::ConfigParse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_value("exercise state", "archived");
        assert_eq!(err.to_string(), "Invalid exercise state: archived");

        let err = CoreError::Config("search_limit must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: search_limit must be positive"
        );
    }

    #[test]
    fn test_error_checks() {
        assert!(CoreError::Config("x".to_string()).is_config_error());
        assert!(!CoreError::InvalidPrice("abc".to_string()).is_config_error());
    }
}
