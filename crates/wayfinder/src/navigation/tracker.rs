//! Step progress: distance to the next maneuver and when to advance.

use crate::geo::{haversine, GeoPoint};
use crate::location::LiveLocation;
use crate::route::NavigationStep;

/// Proximity to a step's end, in meters, below which the step is complete.
pub const ADVANCE_THRESHOLD_M: f64 = 10.0;

/// The step currently being traveled, with the context needed to measure it.
#[derive(Debug, Clone, Copy)]
pub struct ActiveStep<'a> {
    /// The step itself.
    pub step: &'a NavigationStep,
    /// Where the traveler was when this step became active.
    pub started_at: GeoPoint,
    /// Whether this is the final step of the route.
    pub is_last: bool,
}

/// Result of measuring one sample against the active step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepProgress {
    /// Meters left before the maneuver, never negative.
    pub distance_remaining: f64,
    /// The traveler has reached an intermediate maneuver.
    pub should_advance: bool,
    /// The traveler has reached the end of the final step.
    pub arrived: bool,
}

/// Decides when the traveler has completed a step.
///
/// Stateless: every call depends only on its arguments and the configured
/// threshold.
#[derive(Debug, Clone, Copy)]
pub struct StepProgressTracker {
    threshold_m: f64,
}

impl Default for StepProgressTracker {
    fn default() -> Self {
        Self::new(ADVANCE_THRESHOLD_M)
    }
}

impl StepProgressTracker {
    /// Create a tracker with a custom advance threshold.
    #[must_use]
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    /// The advance threshold in meters.
    #[must_use]
    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Measure `location` against the active step.
    ///
    /// When the step carries its maneuver point the remaining distance is the
    /// great-circle distance to it. Otherwise it is the step length minus the
    /// straight-line distance covered since the step began.
    #[must_use]
    pub fn update(&self, location: &LiveLocation, active: &ActiveStep<'_>) -> StepProgress {
        let here = location.point();
        if !here.is_valid() {
            return StepProgress {
                distance_remaining: active.step.distance_m.max(0.0),
                should_advance: false,
                arrived: false,
            };
        }

        let raw = match active.step.end {
            Some(end) => haversine(&here, &end),
            None => active.step.distance_m - haversine(&active.started_at, &here),
        };
        let distance_remaining = if raw.is_finite() {
            raw.max(0.0)
        } else {
            active.step.distance_m.max(0.0)
        };

        let within = distance_remaining < self.threshold_m;
        StepProgress {
            distance_remaining,
            should_advance: within && !active.is_last,
            arrived: within && active.is_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::destination;
    use crate::route::Maneuver;

    const ORIGIN: GeoPoint = GeoPoint::new(47.0, 8.0);

    fn at_meters_north(meters: f64) -> LiveLocation {
        LiveLocation::at(destination(&ORIGIN, 0.0, meters), 5.0)
    }

    fn step(distance: f64) -> NavigationStep {
        NavigationStep::new("Continue", distance, 60, Maneuver::Straight)
    }

    fn active(step: &NavigationStep, is_last: bool) -> ActiveStep<'_> {
        ActiveStep {
            step,
            started_at: ORIGIN,
            is_last,
        }
    }

    #[test]
    fn test_nine_meters_advances_on_second_to_last() {
        let s = step(100.0);
        let progress = StepProgressTracker::default().update(&at_meters_north(91.0), &active(&s, false));
        assert!((progress.distance_remaining - 9.0).abs() < 0.01);
        assert!(progress.should_advance);
        assert!(!progress.arrived);
    }

    #[test]
    fn test_fifty_meters_does_not_advance() {
        let s = step(100.0);
        let progress = StepProgressTracker::default().update(&at_meters_north(50.0), &active(&s, false));
        assert!((progress.distance_remaining - 50.0).abs() < 0.01);
        assert!(!progress.should_advance);
    }

    #[test]
    fn test_last_step_never_advances_but_arrives() {
        let s = step(100.0);
        let progress = StepProgressTracker::default().update(&at_meters_north(95.0), &active(&s, true));
        assert!(!progress.should_advance);
        assert!(progress.arrived);
    }

    #[test]
    fn test_overshoot_clamps_to_zero() {
        let s = step(100.0);
        let progress = StepProgressTracker::default().update(&at_meters_north(400.0), &active(&s, false));
        assert!(progress.distance_remaining.abs() < f64::EPSILON);
        assert!(progress.should_advance);
    }

    #[test]
    fn test_uses_end_point_when_present() {
        let end = destination(&ORIGIN, 90.0, 120.0);
        let s = step(999.0).with_end(end);
        let here = LiveLocation::at(destination(&ORIGIN, 90.0, 100.0), 5.0);
        let progress = StepProgressTracker::default().update(&here, &active(&s, false));
        assert!((progress.distance_remaining - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_threshold_is_strict() {
        let s = step(100.0);
        let tracker = StepProgressTracker::new(10.0);
        let progress = tracker.update(&at_meters_north(89.0), &active(&s, false));
        assert!(!progress.should_advance, "11 m remaining must not advance");
    }

    #[test]
    fn test_never_negative_over_many_samples() {
        let s = step(30.0);
        let tracker = StepProgressTracker::default();
        for meters in (0..200).map(f64::from) {
            let progress = tracker.update(&at_meters_north(meters), &active(&s, false));
            assert!(progress.distance_remaining >= 0.0);
        }
    }

    #[test]
    fn test_non_finite_location_makes_no_progress() {
        let s = step(30.0);
        let sample = LiveLocation::at(GeoPoint::new(f64::NAN, 0.0), 5.0);
        let progress = StepProgressTracker::default().update(&sample, &active(&s, false));
        assert!((progress.distance_remaining - 30.0).abs() < f64::EPSILON);
        assert!(!progress.should_advance);
    }

    #[test]
    fn test_invalid_location_with_maneuver_point_makes_no_progress() {
        let s = step(30.0).with_end(destination(&ORIGIN, 0.0, 30.0));
        let tracker = StepProgressTracker::default();
        for point in [
            GeoPoint::new(f64::NAN, 8.0),
            GeoPoint::new(47.0, f64::INFINITY),
            GeoPoint::new(95.0, 8.0),
        ] {
            let sample = LiveLocation::at(point, 5.0);
            let progress = tracker.update(&sample, &active(&s, true));
            assert!((progress.distance_remaining - 30.0).abs() < f64::EPSILON);
            assert!(!progress.should_advance);
            assert!(!progress.arrived);
        }
    }
}
