//! Map display surface.

use serde::Serialize;
use tracing::trace;

use crate::geo::GeoPoint;

/// What a marker represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Route start.
    Start,
    /// Route destination.
    End,
    /// The traveler's latest position.
    Current,
}

/// A point to draw on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    /// Marker role.
    pub kind: MarkerKind,
    /// Marker position.
    pub position: GeoPoint,
}

impl Marker {
    /// Create a marker.
    #[must_use]
    pub const fn new(kind: MarkerKind, position: GeoPoint) -> Self {
        Self { kind, position }
    }
}

/// A surface that renders markers around a center point.
///
/// The session pushes updates and never waits for rendering.
pub trait MapDisplay: Send {
    /// Redraw centered on `center`.
    fn render(&mut self, center: GeoPoint, markers: &[Marker]);
}

/// Logs map updates at trace level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMap;

impl MapDisplay for TracingMap {
    fn render(&mut self, center: GeoPoint, markers: &[Marker]) {
        trace!(%center, markers = markers.len(), "Map update");
    }
}
