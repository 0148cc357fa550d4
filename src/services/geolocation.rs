//! Where the user is.
//!
//! A browser would ask the platform; here the position comes from
//! configuration or the command line.

use async_trait::async_trait;
use thiserror::Error;

use super::geolookup;
use crate::models::Coordinate;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeolocationError {
    #[error("Location unavailable")]
    Unavailable,

    #[error("Unknown location: {0}")]
    Unknown(String),
}

/// Produces the user's current position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

/// A position known up front (or known to be unavailable).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedLocation(Option<Coordinate>);

impl FixedLocation {
    pub fn at(position: Coordinate) -> Self {
        Self(Some(position))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }

    /// Parse `"lat,lng"` or a known place name.
    pub fn parse(input: &str) -> Result<Self, GeolocationError> {
        resolve_location(input).map(Self::at)
    }
}

/// Resolve `"lat,lng"` or a known place name to a coordinate.
pub fn resolve_location(input: &str) -> Result<Coordinate, GeolocationError> {
    geolookup::resolve(input).ok_or_else(|| GeolocationError::Unknown(input.trim().to_string()))
}

#[async_trait]
impl Geolocator for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        self.0.ok_or(GeolocationError::Unavailable)
    }
}
