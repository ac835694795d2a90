//! Synthetic tracks for simulating a traveler along a route.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::geo::{bearing, destination, haversine, GeoPoint};
use crate::route::Route;

use super::LiveLocation;

/// Accuracy reported for synthesized samples.
const SYNTHETIC_ACCURACY_M: f64 = 5.0;

/// Legs shorter than this are treated as zero length.
const MIN_LEG_M: f64 = 1e-6;

/// Build a track that walks `route` at `speed_mps`, one sample per `interval`.
///
/// Steps with an `end` coordinate are walked to that point. Steps without one
/// are laid out as straight legs of `distance_m` heading toward the route's
/// end point. The track always finishes exactly on the last step's end.
///
/// # Errors
///
/// Returns an error if the speed or interval is not positive, or the route
/// fails validation.
pub fn synthesize_track(
    route: &Route,
    speed_mps: f64,
    interval: Duration,
) -> Result<Vec<LiveLocation>> {
    route.validate()?;

    let stride = speed_mps * interval.as_secs_f64();
    if !stride.is_finite() || stride <= 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "speed ({speed_mps} m/s) and interval ({}ms) must be positive",
                interval.as_millis()
            ),
        });
    }

    let polyline = step_polyline(route);
    let mut samples = Vec::new();
    let first_heading = polyline
        .get(1)
        .map_or(0.0, |next| bearing(&polyline[0], next));
    samples.push(sample(polyline[0], first_heading, speed_mps));

    let mut since_last = 0.0;
    let mut last_heading = first_heading;
    for pair in polyline.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = haversine(&a, &b);
        if len < MIN_LEG_M {
            since_last += len;
            continue;
        }
        let heading = bearing(&a, &b);
        last_heading = heading;

        let mut offset = stride - since_last;
        while offset <= len {
            samples.push(sample(destination(&a, heading, offset), heading, speed_mps));
            offset += stride;
        }
        since_last = len - (offset - stride);
    }

    if since_last > MIN_LEG_M {
        let end = polyline[polyline.len() - 1];
        samples.push(sample(end, last_heading, speed_mps));
    }

    Ok(samples)
}

/// Route start followed by the end point of every step.
fn step_polyline(route: &Route) -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(route.steps.len() + 1);
    points.push(route.start);

    let mut cursor = route.start;
    for step in &route.steps {
        let next = step.end.unwrap_or_else(|| {
            let heading = if haversine(&cursor, &route.end) > f64::EPSILON {
                bearing(&cursor, &route.end)
            } else {
                0.0
            };
            destination(&cursor, heading, step.distance_m)
        });
        points.push(next);
        cursor = next;
    }
    points
}

fn sample(point: GeoPoint, heading: f64, speed_mps: f64) -> LiveLocation {
    LiveLocation {
        heading: Some(heading),
        speed: Some(speed_mps),
        ..LiveLocation::at(point, SYNTHETIC_ACCURACY_M)
    }
}
