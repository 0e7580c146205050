//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Schema or values file missing or unreadable as JSON
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Requested class is not declared
    ClassNotFound,
    /// Declaring or instantiating a class failed
    SchemaError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SQUEMA_CLI_CONFIG_ERROR",
            Self::IoError => "SQUEMA_CLI_IO_ERROR",
            Self::ClassNotFound => "SQUEMA_CLI_CLASS_NOT_FOUND",
            Self::SchemaError => "SQUEMA_CLI_SCHEMA_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
#[error("{}: {}", .code.code(), .message)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn class_not_found(name: &str) -> Self {
        Self::new(
            CliErrorCode::ClassNotFound,
            format!("class '{}' is not declared in the schema document", name),
        )
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::config_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::class_not_found("Point");
        assert_eq!(err.code(), &CliErrorCode::ClassNotFound);
        assert_eq!(
            err.to_string(),
            "SQUEMA_CLI_CLASS_NOT_FOUND: class 'Point' is not declared in the schema document"
        );
    }

    #[test]
    fn test_schema_error_keeps_schema_code() {
        let err: CliError = SchemaError::immutable("Point").into();
        assert_eq!(err.code_str(), "SQUEMA_CLI_SCHEMA_ERROR");
        assert!(err.message().starts_with("SQUEMA_IMMUTABLE"));
    }
}
