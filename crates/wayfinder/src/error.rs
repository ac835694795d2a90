//! Error types for wayfinder.
//!
//! This module defines the crate-level error type. Sensor failures have their
//! own [`LocationError`](crate::location::LocationError) and are wrapped here
//! when they cross the session boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::location::LocationError;
use crate::navigation::SessionState;

/// The main error type for wayfinder operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    /// A control operation was requested in a state that does not permit it.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The lifecycle state at the time of the call.
        state: SessionState,
    },

    /// The location sensor reported a failure.
    #[error(transparent)]
    Location(#[from] LocationError),

    // === Route Errors ===
    /// Failed to read a route or track file.
    #[error("failed to read {path}: {source}")]
    RouteRead {
        /// Path to the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A route failed validation.
    #[error("invalid route: {message}")]
    RouteValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for wayfinder operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(operation: &'static str, state: SessionState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create a route validation error.
    #[must_use]
    pub fn route_validation(message: impl Into<String>) -> Self {
        Self::RouteValidation {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a lifecycle violation.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Check if navigation can continue after this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Location(err) => err.is_transient(),
            Self::InvalidState { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_invalid_state_display() {
        let err = Error::invalid_state("pause", SessionState::Idle);
        assert_eq!(err.to_string(), "cannot pause while session is idle");
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_location_error_is_transparent() {
        let err: Error = LocationError::unavailable("no GPS hardware").into();
        assert_eq!(err.to_string(), "location sensor unavailable: no GPS hardware");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let err: Error = LocationError::Timeout {
            after: Duration::from_secs(10),
        }
        .into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_route_validation_display() {
        let err = Error::route_validation("route has no steps");
        assert!(err.to_string().contains("route has no steps"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_route_read_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::RouteRead {
            path: PathBuf::from("/tmp/route.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/route.json"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid interval".to_string(),
        };
        assert!(err.to_string().contains("invalid interval"));
    }
}
