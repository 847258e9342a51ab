//! # Connection Gate
//!
//! Runs in the host's authentication hook. While `simula.connection_refuse`
//! is on, every new connection is refused; one that reached EOF before
//! presenting credentials is closed without an error report.

use std::sync::Arc;

use thiserror::Error;

use crate::config::GlobalSettings;
use crate::core::CoreError;
use crate::observability::{Event, Logger, MetricsRegistry};

/// Outcome of the host's own authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Ok,
    Failed,
    /// Client disconnected before sending credentials
    Eof,
}

/// What the host knows about an incoming connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub user: String,
    pub remote_addr: Option<String>,
}

impl ConnectionInfo {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

/// Gate decisions that stop a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("authentication failed by simula")]
    Refused,

    #[error("connection closed before authentication")]
    ClosedBeforeAuth,
}

impl From<GateError> for CoreError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Refused => CoreError::ConnectionRefused(e.to_string()),
            GateError::ClosedBeforeAuth => CoreError::ConnectionClosed,
        }
    }
}

/// Unconditional connection refusal policy
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    settings: Arc<GlobalSettings>,
    metrics: Arc<MetricsRegistry>,
}

impl ConnectionGate {
    pub fn new(settings: Arc<GlobalSettings>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { settings, metrics }
    }

    /// Decide whether the connection may proceed past authentication
    ///
    /// With refusal off this is a pass-through: the host's own `status`
    /// stays the host's business.
    pub fn check(&self, info: &ConnectionInfo, status: AuthStatus) -> Result<(), GateError> {
        if !self.settings.connections_refused() {
            return Ok(());
        }

        let remote = info.remote_addr.as_deref().unwrap_or("local");

        if status == AuthStatus::Eof {
            Logger::trace(
                Event::ConnectionDropped.as_str(),
                &[("remote_addr", remote), ("user", &info.user)],
            );
            return Err(GateError::ClosedBeforeAuth);
        }

        self.metrics.increment_connections_refused();
        Logger::warn(
            Event::ConnectionRefused.as_str(),
            &[("remote_addr", remote), ("user", &info.user)],
        );
        Err(GateError::Refused)
    }
}
