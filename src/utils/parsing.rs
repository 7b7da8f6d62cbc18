//! Parsing utilities for CLI arguments and configuration values.
//!
//! This module provides reusable parsing functions for common input formats
//! used throughout the application.

use crate::config::Color;
use crate::error::ValidationError;
use crate::protocol::LightingMode;
use crate::utils::sensors::SensorBackend;

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a hex color string into a [`Color`].
///
/// Accepts formats: `#RRGGBB` or `RRGGBB`
///
/// # Example
/// ```
/// use krakenx::config::Color;
/// use krakenx::utils::parsing::parse_hex_color;
///
/// let color = parse_hex_color("#FF5500").unwrap();
/// assert_eq!(color, Color::new(255, 85, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, ValidationError> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || ValidationError::InvalidInput(format!("Invalid color hex: {}", hex));

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };

    Ok(Color::new(component(0..2)?, component(2..4)?, component(4..6)?))
}

// =============================================================================
// Mode Parsing
// =============================================================================

/// Parse a lighting mode name.
///
/// Case-insensitive; `-`, `_` and spaces are ignored, so `solid-all`,
/// `SolidAll` and `solid_all` are the same mode.
pub fn parse_mode(name: &str) -> Result<LightingMode, ValidationError> {
    name.parse()
}

// =============================================================================
// Sensor Backend Parsing
// =============================================================================

/// Parse a sensor backend name: `lm-sensors` or `sysinfo`.
pub fn parse_sensor_backend(name: &str) -> Result<SensorBackend, ValidationError> {
    name.parse()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color_with_hash() {
        assert_eq!(parse_hex_color("#FF0000").unwrap(), Color::new(255, 0, 0));
    }

    #[test]
    fn test_parse_hex_color_without_hash() {
        assert_eq!(parse_hex_color("00ff00").unwrap(), Color::new(0, 255, 0));
    }

    #[test]
    fn test_parse_hex_color_invalid() {
        assert!(parse_hex_color("FFF").is_err());
        assert!(parse_hex_color("").is_err());
        // Bad digits are rejected, not zeroed.
        assert!(matches!(
            parse_hex_color("#GG0000"),
            Err(ValidationError::InvalidInput(_))
        ));
        assert!(parse_hex_color("#ÿÿÿ").is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("solid").unwrap(), LightingMode::Solid);
        assert_eq!(parse_mode("Solid-All").unwrap(), LightingMode::SolidAll);
        assert_eq!(
            parse_mode("covering_marquee").unwrap(),
            LightingMode::CoveringMarquee
        );
        assert!(matches!(
            parse_mode("rainbow"),
            Err(ValidationError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_parse_sensor_backend() {
        assert_eq!(
            parse_sensor_backend("lm-sensors").unwrap(),
            SensorBackend::LmSensors
        );
        assert_eq!(
            parse_sensor_backend("sysinfo").unwrap(),
            SensorBackend::Sysinfo
        );
        assert!(parse_sensor_backend("wmi").is_err());
    }
}
