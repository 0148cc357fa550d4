//! Geographic coordinate with range validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance (degrees) under which two coordinates name the same location.
pub const SAME_LOCATION_TOLERANCE: f64 = 1e-4;

/// Reasons a latitude/longitude pair is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidCoordinate {
    #[error("coordinate is not a finite number")]
    NonFinite,

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A validated WGS84 point.
///
/// Both components are finite, latitude is within `[-90, 90]` and longitude
/// within `[-180, 180]`. Out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(InvalidCoordinate::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidCoordinate::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Components already known to be in range (taken from other coordinates).
    pub(crate) fn from_validated(lat: f64, lng: f64) -> Self {
        debug_assert!(Self::new(lat, lng).is_ok());
        Self { lat, lng }
    }

    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Self {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }

    /// Straight-line distance in degrees.
    ///
    /// Not a great-circle distance; only used to compare nearby map centers.
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }

    /// Whether both components agree within `tolerance` degrees.
    pub fn approx_eq(&self, other: &Coordinate, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lng - other.lng).abs() <= tolerance
    }

    /// Parse a `"lat,lng"` pair.
    pub fn parse_pair(s: &str) -> Option<Self> {
        let (lat, lng) = s.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        Self::new(lat, lng).ok()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(999.0, 0.0),
            Err(InvalidCoordinate::LatitudeOutOfRange(999.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(InvalidCoordinate::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(
            Coordinate::new(f64::NAN, 0.0),
            Err(InvalidCoordinate::NonFinite)
        );
        assert_eq!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(InvalidCoordinate::NonFinite)
        );
    }

    #[test]
    fn test_accepts_boundaries() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_parse_pair() {
        let c = Coordinate::parse_pair(" 40.7829, -73.9654 ").unwrap();
        assert_eq!(c.lat(), 40.7829);
        assert_eq!(c.lng(), -73.9654);
        assert!(Coordinate::parse_pair("40.7829").is_none());
        assert!(Coordinate::parse_pair("91,0").is_none());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5}"#).unwrap();
        assert_eq!(ok.lng(), 2.5);
        let bad: Result<Coordinate, _> = serde_json::from_str(r#"{"lat": 100.0, "lng": 2.5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_approx_eq() {
        let a = Coordinate::new(40.0, -73.0).unwrap();
        let b = Coordinate::new(40.00005, -73.00005).unwrap();
        let c = Coordinate::new(40.001, -73.0).unwrap();
        assert!(a.approx_eq(&b, SAME_LOCATION_TOLERANCE));
        assert!(!a.approx_eq(&c, SAME_LOCATION_TOLERANCE));
    }
}
