//! Live location input.
//!
//! A [`LocationSource`] wraps a continuous-position sensor and delivers
//! [`LocationEvent`]s, in order, through a channel until its subscription is
//! stopped. Everything downstream of the channel is pure computation.

mod replay;
mod track;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::geo::GeoPoint;

pub use replay::ReplaySource;
pub use track::synthesize_track;

/// Errors reported by a location sensor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The platform has no usable location capability.
    #[error("location sensor unavailable: {0}")]
    Unavailable(String),

    /// The user or platform denied access to location.
    #[error("location permission denied: {0}")]
    PermissionDenied(String),

    /// No position fix arrived in time.
    #[error("no GPS fix after {}s", .after.as_secs())]
    Timeout {
        /// How long we waited.
        after: Duration,
    },

    /// An established position feed went silent or degraded.
    #[error("GPS signal lost: {0}")]
    SignalLost(String),

    /// The source already has a live subscription.
    #[error("location source already running")]
    AlreadyRunning,
}

impl LocationError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Create a signal lost error.
    #[must_use]
    pub fn signal_lost(reason: impl Into<String>) -> Self {
        Self::SignalLost(reason.into())
    }

    /// Whether the sensor is expected to recover on its own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::SignalLost(_))
    }
}

/// A single position sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveLocation {
    /// Latitude in degrees.
    pub lat: f64,

    /// Longitude in degrees.
    pub lng: f64,

    /// Horizontal accuracy radius in meters.
    pub accuracy_m: f64,

    /// Direction of travel in degrees from north.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,

    /// Ground speed in meters per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl LiveLocation {
    /// Create a sample at `point` with the given accuracy.
    #[must_use]
    pub fn at(point: GeoPoint, accuracy_m: f64) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            accuracy_m,
            heading: None,
            speed: None,
        }
    }

    /// The sample's position.
    #[must_use]
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// What a location source delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A new position sample.
    Sample(LiveLocation),
    /// A sensor failure, with a human-readable reason.
    Error(LocationError),
}

/// Identifies one live sensor subscription.
///
/// Clones share the same active flag; releasing any clone releases them all,
/// and only the first release reports `true`.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    id: u64,
    active: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    /// Create a new, active handle.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The subscription id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the subscription is still live.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Release the subscription. Returns `true` only for the call that
    /// actually released it.
    pub fn release(&self) -> bool {
        self.active.swap(false, Ordering::SeqCst)
    }
}

/// A continuous-position sensor.
pub trait LocationSource: Send {
    /// The name of this source (for logging).
    fn name(&self) -> &'static str;

    /// Begin delivering location events through `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Unavailable`] or
    /// [`LocationError::PermissionDenied`] if the sensor cannot be used, and
    /// [`LocationError::AlreadyRunning`] if a subscription is already live.
    fn start(
        &mut self,
        tx: mpsc::Sender<LocationEvent>,
    ) -> Result<SubscriptionHandle, LocationError>;

    /// Stop delivering events for `handle`.
    ///
    /// Must be idempotent and safe to call with a handle that was never
    /// started or has already been released.
    fn stop(&mut self, handle: &SubscriptionHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_error_display() {
        assert!(LocationError::unavailable("no hardware")
            .to_string()
            .contains("unavailable"));
        assert!(LocationError::PermissionDenied("user declined".to_string())
            .to_string()
            .contains("permission"));
        assert_eq!(
            LocationError::Timeout {
                after: Duration::from_secs(10)
            }
            .to_string(),
            "no GPS fix after 10s"
        );
        assert!(LocationError::signal_lost("tunnel")
            .to_string()
            .contains("signal lost"));
        assert!(LocationError::AlreadyRunning
            .to_string()
            .contains("already running"));
    }

    #[test]
    fn test_location_error_transient() {
        assert!(LocationError::signal_lost("x").is_transient());
        assert!(LocationError::Timeout {
            after: Duration::from_secs(1)
        }
        .is_transient());
        assert!(!LocationError::unavailable("x").is_transient());
        assert!(!LocationError::PermissionDenied("x".to_string()).is_transient());
    }

    #[test]
    fn test_subscription_handle_release_once() {
        let handle = SubscriptionHandle::new(7);
        let clone = handle.clone();
        assert_eq!(handle.id(), 7);
        assert!(handle.is_active());

        assert!(clone.release());
        assert!(!handle.is_active());
        assert!(!handle.release());
    }

    #[test]
    fn test_live_location_point() {
        let sample = LiveLocation::at(GeoPoint::new(1.0, 2.0), 5.0);
        assert_eq!(sample.point(), GeoPoint::new(1.0, 2.0));
        assert!(sample.heading.is_none());
    }

    #[test]
    fn test_live_location_deserialize_without_optionals() {
        let json = r#"{"lat": 1.0, "lng": 2.0, "accuracy_m": 4.5}"#;
        let sample: LiveLocation = serde_json::from_str(json).unwrap();
        assert!((sample.accuracy_m - 4.5).abs() < f64::EPSILON);
        assert!(sample.speed.is_none());
    }
}
