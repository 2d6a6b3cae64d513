//! Error types for telemetry operations.

use thiserror::Error;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed, usually because one is already set.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A log format name was not recognised.
    #[error("unknown log format '{value}' (expected json, pretty or auto)")]
    UnknownLogFormat {
        /// Value supplied by the caller.
        value: String,
    },
}

/// Result alias for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
