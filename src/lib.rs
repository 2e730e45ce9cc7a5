//! # GPS Node Library
//!
//! Telemetry node that reads NMEA sentences from a serial GPS receiver,
//! keeps a bounded history of recent fixes and serves it over HTTP while
//! supervising the network uplink.
//!
//! Data flow: serial reader → decoder → coordinate store ← HTTP service.
//! The connectivity manager runs independently and gates when the HTTP
//! service starts.

pub mod config;
pub mod coordinate;
pub mod error;
pub mod http;
pub mod network;
pub mod nmea;
pub mod serial;
pub mod shutdown;
pub mod store;
