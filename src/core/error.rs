//! Core Error Types
//!
//! Host-facing errors. Every error carries a level that tells the session
//! how far the failure reaches: the transaction, the session, or the
//! process.

use std::fmt;

use crate::config::ConfigError;
use crate::engine::SimulaError;

/// Core module result type
pub type CoreResult<T> = Result<T, CoreError>;

/// How far an error reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorLevel {
    /// Aborts the operation and its transaction
    Error,
    /// Additionally ends the session
    Fatal,
    /// Additionally ends the process
    Panic,
}

impl ErrorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLevel::Error => "ERROR",
            ErrorLevel::Fatal => "FATAL",
            ErrorLevel::Panic => "PANIC",
        }
    }
}

impl fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core error type
#[derive(Debug)]
pub enum CoreError {
    /// Raised by the fault-injection engine
    Fault(SimulaError),

    /// Connection refused before a session existed
    ConnectionRefused(String),

    /// Client went away before presenting credentials
    ConnectionClosed,

    /// Host's own authentication rejected the client
    AuthenticationFailed(String),

    /// Statement issued inside a failed transaction block
    TransactionAborted,

    /// Session already ended
    SessionClosed,

    /// Malformed statement or setting
    Validation(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(err) => write!(f, "{}", err),
            Self::ConnectionRefused(msg) => write!(f, "{}", msg),
            Self::ConnectionClosed => write!(f, "connection closed before authentication"),
            Self::AuthenticationFailed(user) => {
                write!(f, "authentication failed for user \"{}\"", user)
            }
            Self::TransactionAborted => write!(
                f,
                "current transaction is aborted, commands ignored until end of transaction block"
            ),
            Self::SessionClosed => write!(f, "session is closed"),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fault(err) => Some(err),
            _ => None,
        }
    }
}

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// How far this error reaches
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::Fault(err) => err.level(),
            Self::ConnectionRefused(_) | Self::ConnectionClosed | Self::AuthenticationFailed(_) => {
                ErrorLevel::Fatal
            }
            _ => ErrorLevel::Error,
        }
    }

    /// Error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fault(err) => err.code(),
            Self::ConnectionRefused(_) => "SIMULA_CONNECTION_REFUSED",
            Self::ConnectionClosed => "SIMULA_CONNECTION_CLOSED",
            Self::AuthenticationFailed(_) => "SIMULA_AUTHENTICATION_FAILED",
            Self::TransactionAborted => "SIMULA_TRANSACTION_ABORTED",
            Self::SessionClosed => "SIMULA_SESSION_CLOSED",
            Self::Validation(_) => "SIMULA_VALIDATION_ERROR",
        }
    }

    /// Whether this error was injected on purpose
    pub fn is_injected(&self) -> bool {
        matches!(self, Self::Fault(err) if err.is_injected())
    }
}

impl From<SimulaError> for CoreError {
    fn from(e: SimulaError) -> Self {
        Self::Fault(e)
    }
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        Self::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(CoreError::TransactionAborted.level(), ErrorLevel::Error);
        assert_eq!(CoreError::ConnectionClosed.level(), ErrorLevel::Fatal);
        let crash = CoreError::from(SimulaError::InjectedCrash {
            operation: "COMMIT".into(),
        });
        assert_eq!(crash.level(), ErrorLevel::Panic);
        assert!(crash.is_injected());
    }

    #[test]
    fn test_level_ordering() {
        assert!(ErrorLevel::Error < ErrorLevel::Fatal);
        assert!(ErrorLevel::Fatal < ErrorLevel::Panic);
    }

    #[test]
    fn test_fault_display_passes_through() {
        let err = CoreError::from(SimulaError::InjectedFailure {
            operation: "DROP TABLE".into(),
        });
        assert_eq!(err.to_string(), "simulation of ERROR by simula");
        assert_eq!(err.code(), "SIMULA_INJECTED_ERROR");
    }
}
