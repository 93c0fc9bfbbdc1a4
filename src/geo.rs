//! Coordinates, routes, and the simulated navigation cursor

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate from a GeoJSON-style `[lon, lat]` pair
    #[must_use]
    pub const fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lon: pair[0],
        }
    }

    /// Return the coordinate as a GeoJSON-style `[lon, lat]` pair
    #[must_use]
    pub const fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Check that both components are finite and within the valid degree ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.5}, {:.5}]", self.lat, self.lon)
    }
}

/// An ordered driving path returned by a router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    points: Vec<Coordinate>,
}

impl Route {
    /// Create a route from its points
    ///
    /// # Errors
    ///
    /// Returns error if the route has no points
    pub fn new(points: Vec<Coordinate>) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::Routing("route has no coordinates".to_string()));
        }
        Ok(Self { points })
    }

    /// All points in travel order
    #[must_use]
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Point at `index`, if any
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Coordinate> {
        self.points.get(index).copied()
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no points (never true for a constructed route)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point
    #[must_use]
    pub fn start(&self) -> Coordinate {
        self.points[0]
    }

    /// Last point
    #[must_use]
    pub fn end(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    /// Center between start and end
    #[must_use]
    pub fn midpoint(&self) -> Coordinate {
        let (a, b) = (self.start(), self.end());
        Coordinate::new(f64::midpoint(a.lat, b.lat), f64::midpoint(a.lon, b.lon))
    }

    /// Evenly downsample to at most `max_points`, always keeping the first and last point
    #[must_use]
    pub fn sample(&self, max_points: usize) -> Vec<Coordinate> {
        let len = self.points.len();
        if max_points == 0 {
            return Vec::new();
        }
        if len <= max_points {
            return self.points.clone();
        }
        if max_points == 1 {
            return vec![self.start()];
        }

        let last = len - 1;
        let slots = max_points - 1;
        (0..max_points)
            .map(|i| self.points[i * last / slots])
            .collect()
    }
}

/// Simulated current position along a route
///
/// Moved only by explicit user input; backward movement is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationCursor {
    index: usize,
    len: usize,
}

impl NavigationCursor {
    /// Create a cursor at the start of a route with `len` points
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// Current index
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Largest valid index
    #[must_use]
    pub const fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Jump to `index`
    ///
    /// # Errors
    ///
    /// Returns error if `index` is past the end of the route
    pub fn set(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(Error::CursorOutOfRange {
                index,
                len: self.len,
            });
        }
        self.index = index;
        Ok(())
    }

    /// Move forward, stopping at the last point
    pub fn advance(&mut self, step: usize) -> usize {
        self.index = self.index.saturating_add(step).min(self.last());
        self.index
    }

    /// Move backward, stopping at the first point
    pub const fn retreat(&mut self, step: usize) -> usize {
        self.index = self.index.saturating_sub(step);
        self.index
    }
}
