//! # Engine Errors

use thiserror::Error;

use crate::core::ErrorLevel;
use crate::rules::StoreError;

/// Result type for engine operations
pub type SimulaResult<T> = Result<T, SimulaError>;

/// Errors raised while intercepting an operation
#[derive(Debug, Clone, Error)]
pub enum SimulaError {
    #[error("simulation of ERROR by simula")]
    InjectedFailure { operation: String },

    #[error("simulation of PANIC by simula")]
    InjectedCrash { operation: String },

    #[error("simulation of FATAL by simula")]
    InjectedTermination { operation: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SimulaError {
    /// How far the error reaches once the host sees it
    pub fn level(&self) -> ErrorLevel {
        match self {
            SimulaError::InjectedCrash { .. } => ErrorLevel::Panic,
            SimulaError::InjectedTermination { .. } => ErrorLevel::Fatal,
            SimulaError::InjectedFailure { .. }
            | SimulaError::Store(_)
            | SimulaError::Internal(_) => ErrorLevel::Error,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SimulaError::InjectedFailure { .. } => "SIMULA_INJECTED_ERROR",
            SimulaError::InjectedCrash { .. } => "SIMULA_INJECTED_PANIC",
            SimulaError::InjectedTermination { .. } => "SIMULA_INJECTED_FATAL",
            SimulaError::Store(_) => "SIMULA_RULE_STORE_ERROR",
            SimulaError::Internal(_) => "SIMULA_INTERNAL_ERROR",
        }
    }

    /// Whether a rule asked for this error
    pub fn is_injected(&self) -> bool {
        matches!(
            self,
            SimulaError::InjectedFailure { .. }
                | SimulaError::InjectedCrash { .. }
                | SimulaError::InjectedTermination { .. }
        )
    }

    /// Operation the fault was injected into, if any
    pub fn operation(&self) -> Option<&str> {
        match self {
            SimulaError::InjectedFailure { operation }
            | SimulaError::InjectedCrash { operation }
            | SimulaError::InjectedTermination { operation } => Some(operation),
            _ => None,
        }
    }
}
