//! Device status parsing for the Kraken X52.
//!
//! Parses 64-byte status reports into structured readings.

use byteorder::{BigEndian, ByteOrder};

// =============================================================================
// Response Parsing Offsets
// =============================================================================

/// Length of a status report read from the status endpoint.
pub const STATUS_REPORT_LENGTH: usize = 64;

/// Offset for liquid temperature integer part.
const OFFSET_TEMP_INT: usize = 1;
/// Offset for liquid temperature tenths digit.
const OFFSET_TEMP_DEC: usize = 2;
/// Offset for fan RPM (big-endian u16).
const OFFSET_FAN_RPM: usize = 3;
/// Offset for pump RPM (big-endian u16).
const OFFSET_PUMP_RPM: usize = 5;

// =============================================================================
// Status Structures
// =============================================================================

/// Device status readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReading {
    /// Fan speed in RPM.
    pub fan_rpm: u16,
    /// Pump speed in RPM.
    pub pump_rpm: u16,
    /// Liquid coolant temperature in Celsius.
    pub liquid_temp_c: f32,
}

impl StatusReading {
    /// Decode a status report.
    ///
    /// Only bytes 1-6 are interpreted. Pure and total: the length is enforced
    /// by the array type.
    pub fn decode(buf: &[u8; STATUS_REPORT_LENGTH]) -> Self {
        let liquid_temp_c = f32::from(buf[OFFSET_TEMP_INT]) + f32::from(buf[OFFSET_TEMP_DEC]) / 10.0;
        let fan_rpm = BigEndian::read_u16(&buf[OFFSET_FAN_RPM..OFFSET_FAN_RPM + 2]);
        let pump_rpm = BigEndian::read_u16(&buf[OFFSET_PUMP_RPM..OFFSET_PUMP_RPM + 2]);

        StatusReading {
            fan_rpm,
            pump_rpm,
            liquid_temp_c,
        }
    }
}

impl std::fmt::Display for StatusReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Device status:")?;
        writeln!(f, "fan_speed {}", self.fan_rpm)?;
        writeln!(f, "liquid_temperature {:.1}", self.liquid_temp_c)?;
        writeln!(f, "pump_speed {}", self.pump_rpm)
    }
}
