//! # Coordinate
//!
//! A single WGS-84 fix in signed decimal degrees.
//!
//! Values can only be built through [`Coordinate::new`], which rejects
//! anything outside `[-90, 90]` latitude / `[-180, 180]` longitude, so every
//! `Coordinate` that reaches the store is in range. The JSON form is
//! `{"latitude": F, "longitude": F}` in both directions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum absolute latitude in degrees
pub const MAX_LATITUDE: f64 = 90.0;

/// Maximum absolute longitude in degrees
pub const MAX_LONGITUDE: f64 = 180.0;

/// Geographic position in decimal degrees (negative = South/West)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Unchecked wire form used while deserializing
#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

/// Rejected coordinate values
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("coordinate out of range: latitude {latitude} longitude {longitude}")]
pub struct OutOfRange {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, validating both axes
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRange`] if either value is not finite or exceeds its
    /// axis bound.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, OutOfRange> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && latitude.abs() <= MAX_LATITUDE
            && longitude.abs() <= MAX_LONGITUDE;

        if valid {
            Ok(Self { latitude, longitude })
        } else {
            Err(OutOfRange { latitude, longitude })
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = OutOfRange;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
