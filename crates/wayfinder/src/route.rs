//! Route and step types handed to a navigation session.
//!
//! Routes are computed elsewhere; this module only describes their shape,
//! validates them, and loads them through a [`RouteSupplier`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::GeoPoint;

/// The directional action required at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Maneuver {
    /// Continue straight ahead.
    Straight,
    /// Turn left.
    TurnLeft,
    /// Turn right.
    TurnRight,
    /// Arrive at the destination.
    Arrive,
}

impl std::fmt::Display for Maneuver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Straight => write!(f, "straight"),
            Self::TurnLeft => write!(f, "turn-left"),
            Self::TurnRight => write!(f, "turn-right"),
            Self::Arrive => write!(f, "arrive"),
        }
    }
}

/// How the traveler is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// On foot.
    #[default]
    Walking,
    /// Wheelchair or other mobility aid.
    Wheelchair,
    /// Public transit.
    Transit,
    /// Private vehicle.
    Driving,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Walking => write!(f, "walking"),
            Self::Wheelchair => write!(f, "wheelchair"),
            Self::Transit => write!(f, "transit"),
            Self::Driving => write!(f, "driving"),
        }
    }
}

/// One leg of a route between two maneuvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    /// Instruction text spoken and displayed for this step.
    pub instruction: String,

    /// Distance to traverse before this step completes, in meters.
    pub distance_m: f64,

    /// Expected time to traverse this step, in seconds.
    pub duration_s: u64,

    /// Maneuver performed at the end of this step.
    pub maneuver: Maneuver,

    /// Accessibility information for this step (ramps, tactile paving, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_note: Option<String>,

    /// Hazard or obstruction warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Location of the maneuver point, when the route supplier provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<GeoPoint>,
}

impl NavigationStep {
    /// Create a step without accessibility metadata or geometry.
    #[must_use]
    pub fn new(
        instruction: impl Into<String>,
        distance_m: f64,
        duration_s: u64,
        maneuver: Maneuver,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            distance_m,
            duration_s,
            maneuver,
            accessibility_note: None,
            warning: None,
            end: None,
        }
    }

    /// Attach the maneuver point.
    #[must_use]
    pub fn with_end(mut self, end: GeoPoint) -> Self {
        self.end = Some(end);
        self
    }

    /// Attach an accessibility note.
    #[must_use]
    pub fn with_accessibility_note(mut self, note: impl Into<String>) -> Self {
        self.accessibility_note = Some(note.into());
        self
    }

    /// Attach a warning.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// An immutable, externally computed route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Where the route begins.
    pub start: GeoPoint,

    /// Where the route ends.
    pub end: GeoPoint,

    /// Intermediate points, in travel order.
    #[serde(default)]
    pub waypoints: Vec<GeoPoint>,

    /// Transport mode the route was computed for.
    #[serde(default)]
    pub mode: TransportMode,

    /// Total estimated duration in seconds.
    pub total_duration_s: u64,

    /// Total distance in meters.
    pub total_distance_m: f64,

    /// Ordered steps.
    pub steps: Vec<NavigationStep>,
}

impl Route {
    /// Parse a route from its JSON representation and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the route is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let route: Self = serde_json::from_str(json)?;
        route.validate()?;
        Ok(route)
    }

    /// Validate the route.
    ///
    /// # Errors
    ///
    /// Returns an error if the route has no steps, a step has a negative or
    /// non-finite distance, any coordinate is out of range, or a step other
    /// than the last one is an arrival.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::route_validation("route has no steps"));
        }

        if !self.start.is_valid() || !self.end.is_valid() {
            return Err(Error::route_validation("start or end coordinate out of range"));
        }

        if let Some(point) = self.waypoints.iter().find(|p| !p.is_valid()) {
            return Err(Error::route_validation(format!(
                "waypoint {point} out of range"
            )));
        }

        if !self.total_distance_m.is_finite() || self.total_distance_m < 0.0 {
            return Err(Error::route_validation("total distance must be non-negative"));
        }

        let last = self.steps.len() - 1;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.distance_m.is_finite() || step.distance_m < 0.0 {
                return Err(Error::route_validation(format!(
                    "step {index} has invalid distance {}",
                    step.distance_m
                )));
            }
            if step.end.is_some_and(|p| !p.is_valid()) {
                return Err(Error::route_validation(format!(
                    "step {index} end coordinate out of range"
                )));
            }
            if step.maneuver == Maneuver::Arrive && index != last {
                return Err(Error::route_validation(format!(
                    "step {index} arrives before the final step"
                )));
            }
        }

        Ok(())
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Sum of step distances from `index` onwards.
    #[must_use]
    pub fn distance_from(&self, index: usize) -> f64 {
        self.steps.iter().skip(index).map(|s| s.distance_m).sum()
    }

    /// Durations of the steps from `index` onwards.
    pub fn durations_from(&self, index: usize) -> impl Iterator<Item = u64> + '_ {
        self.steps.iter().skip(index).map(|s| s.duration_s)
    }
}

/// Something that hands a computed route to the navigation core.
#[async_trait]
pub trait RouteSupplier: Send + Sync {
    /// Fetch the route.
    ///
    /// # Errors
    ///
    /// Returns an error if the route cannot be obtained or is invalid.
    async fn route(&self) -> Result<Route>;
}

/// Supplies a route stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSupplier {
    path: PathBuf,
}

impl JsonFileSupplier {
    /// Create a supplier reading from `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path this supplier reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RouteSupplier for JsonFileSupplier {
    async fn route(&self) -> Result<Route> {
        debug!("Loading route from {}", self.path.display());
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| Error::RouteRead {
                path: self.path.clone(),
                source,
            })?;
        Route::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Route {
        Route {
            start: GeoPoint::new(52.0, 13.0),
            end: GeoPoint::new(52.002, 13.0),
            waypoints: vec![GeoPoint::new(52.001, 13.0)],
            mode: TransportMode::Wheelchair,
            total_duration_s: 180,
            total_distance_m: 222.4,
            steps: vec![
                NavigationStep::new("Head north on Main Street", 111.2, 90, Maneuver::Straight)
                    .with_accessibility_note("Curb cut at the corner"),
                NavigationStep::new("Arrive at the library", 111.2, 90, Maneuver::Arrive)
                    .with_warning("Construction on the east side"),
            ],
        }
    }

    #[test]
    fn test_maneuver_display() {
        assert_eq!(Maneuver::Straight.to_string(), "straight");
        assert_eq!(Maneuver::TurnLeft.to_string(), "turn-left");
        assert_eq!(Maneuver::TurnRight.to_string(), "turn-right");
        assert_eq!(Maneuver::Arrive.to_string(), "arrive");
    }

    #[test]
    fn test_maneuver_serde_names() {
        let json = serde_json::to_string(&Maneuver::TurnLeft).unwrap();
        assert_eq!(json, "\"turn-left\"");
        let parsed: Maneuver = serde_json::from_str("\"turn-right\"").unwrap();
        assert_eq!(parsed, Maneuver::TurnRight);
    }

    #[test]
    fn test_transport_mode_default() {
        assert_eq!(TransportMode::default(), TransportMode::Walking);
        assert_eq!(TransportMode::Wheelchair.to_string(), "wheelchair");
    }

    #[test]
    fn test_validate_sample_route() {
        assert!(sample_route().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_steps() {
        let mut route = sample_route();
        route.steps.clear();
        let err = route.validate().unwrap_err().to_string();
        assert!(err.contains("no steps"));
    }

    #[test]
    fn test_validate_negative_distance() {
        let mut route = sample_route();
        route.steps[0].distance_m = -1.0;
        let err = route.validate().unwrap_err().to_string();
        assert!(err.contains("step 0"));
    }

    #[test]
    fn test_validate_early_arrival() {
        let mut route = sample_route();
        route.steps[0].maneuver = Maneuver::Arrive;
        let err = route.validate().unwrap_err().to_string();
        assert!(err.contains("arrives before"));
    }

    #[test]
    fn test_validate_bad_waypoint() {
        let mut route = sample_route();
        route.waypoints.push(GeoPoint::new(120.0, 0.0));
        assert!(route.validate().is_err());
    }

    #[test]
    fn test_distance_and_durations_from() {
        let route = sample_route();
        assert!((route.distance_from(0) - 222.4).abs() < 1e-9);
        assert!((route.distance_from(1) - 111.2).abs() < 1e-9);
        assert!(route.distance_from(2).abs() < f64::EPSILON);
        assert_eq!(route.durations_from(1).sum::<u64>(), 90);
    }

    #[test]
    fn test_from_json_minimal() {
        let json = r#"{
            "start": {"lat": 1.0, "lng": 2.0},
            "end": {"lat": 1.001, "lng": 2.0},
            "total_duration_s": 60,
            "total_distance_m": 111.0,
            "steps": [
                {"instruction": "Arrive", "distance_m": 111.0, "duration_s": 60, "maneuver": "arrive"}
            ]
        }"#;
        let route = Route::from_json(json).unwrap();
        assert_eq!(route.mode, TransportMode::Walking);
        assert!(route.waypoints.is_empty());
        assert!(route.steps[0].end.is_none());
    }

    #[test]
    fn test_serialization_skips_empty_options() {
        let step = NavigationStep::new("Go", 10.0, 5, Maneuver::Straight);
        let json = serde_json::to_string(&step).unwrap();
        assert!(!json.contains("warning"));
        assert!(!json.contains("accessibility_note"));
    }

    #[tokio::test]
    async fn test_json_file_supplier_missing_file() {
        let supplier = JsonFileSupplier::new("/nonexistent/route.json");
        let err = supplier.route().await.unwrap_err();
        assert!(matches!(err, Error::RouteRead { .. }));
    }

    #[tokio::test]
    async fn test_json_file_supplier_reads_route() {
        let path = std::env::temp_dir().join(format!("wayfinder-route-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&sample_route()).unwrap()).unwrap();

        let route = JsonFileSupplier::new(&path).route().await.unwrap();
        assert_eq!(route, sample_route());

        let _ = std::fs::remove_file(&path);
    }
}
