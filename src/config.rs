//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use crate::error::{GpsNodeError, Result};

/// Baud rates accepted for the GPS receiver
const SUPPORTED_BAUD_RATES: &[u32] = &[4800, 9600, 19200, 38400, 57600, 115200];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port and reader loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,

    #[serde(default = "default_silence_threshold_ms")]
    pub silence_threshold_ms: u64,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Coordinate store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Connectivity manager configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_probe_address")]
    pub probe_address: String,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,

    #[serde(default = "default_address_attempts")]
    pub address_attempts: u32,

    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,
}

/// HTTP exposition configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    #[serde(default = "default_http_port")]
    pub port: u16,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; empty logs to stdout only
    #[serde(default)]
    pub directory: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_read_timeout_ms() -> u64 { 100 }
fn default_buffer_size() -> usize { 1024 }
fn default_cycle_delay_ms() -> u64 { 100 }
fn default_silence_threshold_ms() -> u64 { 10_000 }
fn default_reconnect_interval_ms() -> u64 { 2000 }

fn default_capacity() -> usize { 100 }

fn default_probe_address() -> String { "8.8.8.8:80".to_string() }
fn default_retry_interval_ms() -> u64 { 2000 }
fn default_address_attempts() -> u32 { 10 }
fn default_watchdog_interval_ms() -> u64 { 5000 }

fn default_bind_address() -> IpAddr { IpAddr::V4(Ipv4Addr::UNSPECIFIED) }
fn default_http_port() -> u16 { 80 }
fn default_max_body_bytes() -> usize { 1024 }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            buffer_size: default_buffer_size(),
            cycle_delay_ms: default_cycle_delay_ms(),
            silence_threshold_ms: default_silence_threshold_ms(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_address: default_probe_address(),
            retry_interval_ms: default_retry_interval_ms(),
            address_attempts: default_address_attempts(),
            watchdog_interval_ms: default_watchdog_interval_ms(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_http_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    pub fn silence_threshold(&self) -> Duration {
        Duration::from_millis(self.silence_threshold_ms)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

impl NetworkConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gps_node::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 4800, 9600, 19200, 38400, 57600, 115200",
            ));
        }

        if self.serial.read_timeout_ms == 0 || self.serial.read_timeout_ms > 10_000 {
            return Err(invalid("read_timeout_ms must be between 1 and 10000"));
        }

        if self.serial.buffer_size < 128 || self.serial.buffer_size > 65_536 {
            return Err(invalid("buffer_size must be between 128 and 65536"));
        }

        if self.serial.cycle_delay_ms > 60_000 {
            return Err(invalid("cycle_delay_ms must be at most 60000"));
        }

        if self.serial.silence_threshold_ms == 0 {
            return Err(invalid("silence_threshold_ms must be greater than 0"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60_000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        if self.store.capacity == 0 {
            return Err(invalid("store capacity must be greater than 0"));
        }

        if self.network.probe_address.is_empty() {
            return Err(invalid("probe_address cannot be empty"));
        }

        if self.network.retry_interval_ms == 0 || self.network.retry_interval_ms > 60_000 {
            return Err(invalid("retry_interval_ms must be between 1 and 60000"));
        }

        if self.network.address_attempts == 0 {
            return Err(invalid("address_attempts must be greater than 0"));
        }

        if self.network.watchdog_interval_ms == 0 || self.network.watchdog_interval_ms > 600_000 {
            return Err(invalid("watchdog_interval_ms must be between 1 and 600000"));
        }

        if self.http.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes must be greater than 0"));
        }

        if self.logging.level.is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> GpsNodeError {
    GpsNodeError::Config(toml::de::Error::custom(message))
}
