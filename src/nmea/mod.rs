//! # NMEA Module
//!
//! Positioning sentences as delivered by a serial GPS receiver.
//!
//! This module handles:
//! - Sentence constants and field layout of the GGA fix sentence
//! - Decoding a fix sentence into a [`Coordinate`](crate::coordinate::Coordinate)
//! - Extracting complete sentences from a raw serial byte stream

pub mod decoder;
pub mod framer;
pub mod protocol;

pub use decoder::{decode, DecodeError};
pub use framer::SentenceFramer;
