//! Proximity triggering
//!
//! Distances are planar, in degrees, with no geodesic correction. The
//! trigger keeps no memory of what has already fired: asking again at the
//! same position returns the same waypoints again.

use super::Waypoint;
use crate::geo::Coordinate;

/// Distance (in degrees) under which a waypoint counts as reached
pub const DEFAULT_TRIGGER_THRESHOLD: f64 = 0.01;

/// Euclidean distance between two coordinates treated as flat `(lon, lat)` points
#[must_use]
pub fn planar_distance(a: Coordinate, b: Coordinate) -> f64 {
    (a.lon - b.lon).hypot(a.lat - b.lat)
}

/// Waypoints strictly closer than `threshold` to `position`, in input order
#[must_use]
pub fn trigger(position: Coordinate, waypoints: &[Waypoint], threshold: f64) -> Vec<&Waypoint> {
    trigger_indices(position, waypoints, threshold)
        .into_iter()
        .map(|i| &waypoints[i])
        .collect()
}

/// Indices of waypoints strictly closer than `threshold` to `position`
#[must_use]
pub fn trigger_indices(position: Coordinate, waypoints: &[Waypoint], threshold: f64) -> Vec<usize> {
    waypoints
        .iter()
        .enumerate()
        .filter(|(_, w)| planar_distance(position, w.coordinate()) < threshold)
        .map(|(i, _)| i)
        .collect()
}
