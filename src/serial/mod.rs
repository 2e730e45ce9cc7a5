//! # Serial Communication Module
//!
//! Handles the serial link to the GPS receiver.
//!
//! This module handles:
//! - Opening the serial port (8N1 at the configured baud rate)
//! - Bounded-wait reads behind the [`SerialSource`] trait
//! - The reader loop that feeds decoded fixes into the store
//! - Detecting a silent receiver

pub mod port_trait;
pub mod reader;
pub mod silence;

pub use port_trait::{AsyncReadSource, SerialSource, TokioSerialPort};
pub use reader::{ReaderStats, SerialReader};
pub use silence::SilenceMonitor;

use crate::config::SerialConfig;
use crate::error::{GpsNodeError, Result};
use crate::shutdown::Shutdown;
use tracing::{info, warn};

/// Open the GPS serial port with NMEA settings
///
/// # Arguments
///
/// * `config` - Serial configuration (device path and baud rate)
///
/// # Returns
///
/// * `Result<TokioSerialPort>` - Opened port wrapped as a serial source
///
/// # Errors
///
/// Returns [`GpsNodeError::Serial`] if the device cannot be opened
///
/// # Examples
///
/// ```no_run
/// use gps_node::config::SerialConfig;
/// use gps_node::serial;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let port = serial::open(&SerialConfig::default())?;
///     Ok(())
/// }
/// ```
pub fn open(config: &SerialConfig) -> Result<TokioSerialPort> {
    use tokio_serial::SerialPortBuilderExt;

    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| GpsNodeError::Serial(format!("Failed to open {}: {}", config.port, e)))?;

    info!("Opened GPS serial port {} at {} baud", config.port, config.baud_rate);
    Ok(AsyncReadSource::new(stream))
}

/// Keep trying to open the port until it succeeds or shutdown fires
///
/// Returns `None` only when shutdown was requested first.
pub async fn open_with_retry(
    config: &SerialConfig,
    mut shutdown: Shutdown,
) -> Option<TokioSerialPort> {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match open(config) {
            Ok(port) => return Some(port),
            Err(e) if attempt == 1 => {
                warn!("{} (retrying every {:?})", e, config.reconnect_interval())
            }
            Err(_) => {}
        }

        tokio::select! {
            _ = shutdown.recv() => return None,
            _ = tokio::time::sleep(config.reconnect_interval()) => {}
        }
    }
}
