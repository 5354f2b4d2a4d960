/*!
 * A single timestamped GPS fix.
 *
 * A TracePoint is the unit of input for the whole pipeline. Traces are kept in the order they
 * were recorded, which is assumed to be chronological.
 */

use crate::geometry::Coord;
use chrono::{DateTime, Utc};

/**
 * One position report from a vehicle or implement.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// When the fix was recorded.
    pub timestamp: DateTime<Utc>,
}

impl TracePoint {
    pub fn new(lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Self {
        TracePoint {
            lat,
            lon,
            timestamp,
        }
    }

    /// The position of this fix without the time.
    pub fn coord(&self) -> Coord {
        Coord {
            lat: self.lat,
            lon: self.lon,
        }
    }
}
