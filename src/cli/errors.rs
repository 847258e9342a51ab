//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::core::CoreError;
use crate::rules::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Rule rejected at write time
    InvalidRule,
    /// Rule store unreadable or unwritable
    StoreError,
    /// Session could not be opened or was ended
    SessionError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SIMULA_CLI_CONFIG_ERROR",
            Self::IoError => "SIMULA_CLI_IO_ERROR",
            Self::InvalidRule => "SIMULA_CLI_INVALID_RULE",
            Self::StoreError => "SIMULA_CLI_STORE_ERROR",
            Self::SessionError => "SIMULA_CLI_SESSION_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Session error
    pub fn session_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SessionError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        let code = if e.is_validation() {
            CliErrorCode::InvalidRule
        } else {
            CliErrorCode::StoreError
        };
        Self::new(code, e.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        Self::session_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        let err = CliError::from(StoreError::InvalidAction("explode".into()));
        assert_eq!(err.code(), &CliErrorCode::InvalidRule);

        let err = CliError::from(StoreError::Io("disk".into()));
        assert_eq!(err.code_str(), "SIMULA_CLI_STORE_ERROR");
    }

    #[test]
    fn test_display() {
        let err = CliError::config_error("missing file");
        assert_eq!(err.to_string(), "SIMULA_CLI_CONFIG_ERROR: missing file");
        assert_eq!(err.message(), "missing file");
    }
}
