//! Custom error types for NZXT Kraken X52 devices.
//!
//! This module provides fine-grained error handling for configuration
//! validation, USB transport, sensor sampling and protocol invariants.

use thiserror::Error;

/// A configuration field failed validation.
///
/// Raised before any frame reaches the device; nothing is partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Integer field outside its inclusive range.
    #[error("{field} must be an integer between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Color given with the wrong number of components.
    #[error("{field} must have exactly 3 components, got {len}")]
    ColorArity { field: String, len: usize },

    /// Color component outside 0-255.
    #[error("{field} component {index} must be between 0 and 255, got {value}")]
    ColorComponent {
        field: String,
        index: usize,
        value: i64,
    },

    /// Lighting mode name not in the supported set.
    #[error("Unknown lighting mode '{0}'. Use: solid, solid-all, breathing, pulse, fading, covering-marquee, spectrum-wave")]
    UnknownMode(String),

    /// Malformed textual input (hex colors, backend names, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failure reading the host temperature sensors.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The sensor utility could not be run or exited with an error.
    #[error("Failed to run sensor command: {0}")]
    CommandFailed(String),

    /// Sensor output could not be parsed.
    #[error("Unparsable reading for sensor '{label}': '{value}'")]
    Unparsable { label: String, value: String },

    /// Requested sensor channel is not reported by the host.
    #[error("Sensor channel '{0}' not found")]
    ChannelNotFound(String),

    /// Sensor reported NaN or infinity.
    #[error("Sensor channel '{channel}' returned a non-finite value ({value})")]
    NotFinite { channel: String, value: f64 },
}

/// USB transport failure.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("Kraken X52 not found. Check USB connection and permissions.")]
    DeviceNotFound,

    #[error("Interface not available (may be claimed by another driver)")]
    InterfaceNotAvailable,

    #[error("Transfer error on endpoint {endpoint:#04x}: {message}")]
    Transfer { endpoint: u8, message: String },

    #[error("Short read on endpoint {endpoint:#04x}: {got} bytes, expected {expected}")]
    ShortRead {
        endpoint: u8,
        expected: usize,
        got: usize,
    },
}

/// Main error type for Kraken device operations.
#[derive(Error, Debug)]
pub enum KrakenError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sensor(#[from] SensorError),

    /// Encoder reached a state the validator should have ruled out.
    #[error("Protocol invariant violated: {0}")]
    ProtocolInvariant(String),

    /// The background feedback task terminated abnormally.
    #[error("Feedback controller thread panicked")]
    ControllerPanicked,

    /// Settings file could not be read or parsed.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Result type alias for Kraken operations.
pub type Result<T> = std::result::Result<T, KrakenError>;
