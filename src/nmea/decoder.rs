//! # NMEA Sentence Decoder
//!
//! Decodes GGA fix sentences into coordinates.
//!
//! Parsing is lenient about *missing* data: an absent or empty magnitude
//! decodes as 0.0 and an absent hemisphere as `N`/`E`, which is what a
//! receiver without a satellite fix emits. Data that is present but not a
//! valid `DDMM.MMMM` magnitude or hemisphere letter is rejected instead of
//! being zero-filled.

use thiserror::Error;

use super::protocol::*;
use crate::coordinate::{Coordinate, OutOfRange};

/// Decode failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Not a fix sentence (other sentence types land here too)
    #[error("unrecognized sentence identifier: {0:?}")]
    UnrecognizedSentence(String),

    /// A field is present but malformed
    #[error("invalid {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Decoded position is outside WGS-84 bounds
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
}

/// Decode a single sentence into a coordinate
///
/// # Arguments
///
/// * `sentence` - One sentence, with or without the trailing line terminator
///   and `*hh` checksum suffix
///
/// # Returns
///
/// * `Result<Coordinate, DecodeError>` - Decoded fix, or the reason it was rejected
///
/// # Examples
///
/// ```
/// use gps_node::nmea::decode;
///
/// let fix = decode("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47").unwrap();
/// assert!((fix.latitude() - 48.1173).abs() < 1e-4);
/// assert!((fix.longitude() - 11.5167).abs() < 1e-4);
/// ```
pub fn decode(sentence: &str) -> Result<Coordinate, DecodeError> {
    let trimmed = sentence.trim();
    let body = match trimmed.split_once(CHECKSUM_DELIMITER) {
        Some((body, _checksum)) => body,
        None => trimmed,
    };

    let fields: Vec<&str> = body.split(FIELD_DELIMITER).collect();
    let id = fields.first().copied().unwrap_or_default();
    if !is_fix_sentence_id(id) {
        return Err(DecodeError::UnrecognizedSentence(id.to_string()));
    }

    let field = |index: usize| fields.get(index).map(|f| f.trim()).unwrap_or_default();

    let latitude = parse_magnitude("latitude", field(FIELD_LATITUDE))?;
    let north_south = parse_hemisphere(
        "latitude hemisphere",
        field(FIELD_LATITUDE_HEMISPHERE),
        Hemisphere::latitude,
        Hemisphere::North,
    )?;

    let longitude = parse_magnitude("longitude", field(FIELD_LONGITUDE))?;
    let east_west = parse_hemisphere(
        "longitude hemisphere",
        field(FIELD_LONGITUDE_HEMISPHERE),
        Hemisphere::longitude,
        Hemisphere::East,
    )?;

    Ok(Coordinate::new(
        latitude * north_south.sign(),
        longitude * east_west.sign(),
    )?)
}

/// Convert a `DDMM.MMMM` / `DDDMM.MMMM` magnitude to decimal degrees
fn parse_magnitude(field: &'static str, raw: &str) -> Result<f64, DecodeError> {
    if raw.is_empty() {
        return Ok(0.0);
    }

    let invalid = || DecodeError::InvalidField {
        field,
        value: raw.to_string(),
    };

    let magnitude: f64 = raw.parse().map_err(|_| invalid())?;
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(invalid());
    }

    let degrees = (magnitude / 100.0).floor();
    let minutes = magnitude - degrees * 100.0;
    if minutes >= MINUTES_PER_DEGREE {
        return Err(invalid());
    }

    Ok(degrees + minutes / MINUTES_PER_DEGREE)
}

fn parse_hemisphere(
    field: &'static str,
    raw: &str,
    parse: fn(&str) -> Option<Hemisphere>,
    default: Hemisphere,
) -> Result<Hemisphere, DecodeError> {
    if raw.is_empty() {
        return Ok(default);
    }

    parse(raw).ok_or_else(|| DecodeError::InvalidField {
        field,
        value: raw.to_string(),
    })
}
