// Failure taxonomy for supervisor operations.

use std::time::Duration;

use thiserror::Error;

/// Why an operation did not produce a result.
///
/// An absent unit is not an error: it resolves to
/// [`NormalizedStatus::NotFound`](super::NormalizedStatus::NotFound).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("failed to connect to the service manager: {0}")]
    ConnectionFailed(String),

    #[error("failed to drop privileges from uid {effective} to uid {real}: {reason}")]
    PrivilegeDropFailed {
        real: u32,
        effective: u32,
        reason: String,
    },

    #[error("{method} failed: {message}")]
    RemoteCallFailed { method: String, message: String },

    #[error("operation exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

/// Failure of a single request on an open connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("{0}")]
    Remote(String),

    #[error("request timed out")]
    TimedOut,
}
