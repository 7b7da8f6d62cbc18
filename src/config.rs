//! Lighting and speed configuration for the Kraken X52.
//!
//! A [`Configuration`] is the single source of truth for every outbound frame.
//! It is revalidated before each device write.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
pub use crate::protocol::LightingMode;

// =============================================================================
// Bounds
// =============================================================================

/// Number of color slots the device accepts.
pub const MAX_COLORS: usize = 8;

pub const ANIMATION_SPEED_RANGE: (u8, u8) = (0, 4);
pub const FAN_SPEED_RANGE: (u8, u8) = (25, 100);
pub const PUMP_SPEED_RANGE: (u8, u8) = (60, 100);
pub const MAX_SAFE_TEMP_RANGE: (u8, u8) = (30, 85);
pub const COLOR_COUNT_RANGE: (usize, usize) = (1, MAX_COLORS);

// =============================================================================
// Color
// =============================================================================

/// RGB color triple.
///
/// Only constructible through checked constructors, so a `Color` value always
/// holds exactly three components in 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "[u8; 3]")]
pub struct Color([u8; 3]);

impl Color {
    /// Red, used wherever the device needs a filler color.
    pub const DEFAULT: Self = Self([255, 0, 0]);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self([red, green, blue])
    }

    /// Build a color from untyped components, rejecting (never clamping)
    /// wrong arity or out-of-range values.
    pub fn from_components(components: &[i64]) -> Result<Self, ValidationError> {
        Self::checked("color", components)
    }

    fn checked(field: &str, components: &[i64]) -> Result<Self, ValidationError> {
        let [r, g, b] = components else {
            return Err(ValidationError::ColorArity {
                field: field.to_string(),
                len: components.len(),
            });
        };

        let mut rgb = [0u8; 3];
        for (index, (slot, value)) in rgb.iter_mut().zip([*r, *g, *b]).enumerate() {
            *slot = u8::try_from(value).map_err(|_| ValidationError::ColorComponent {
                field: field.to_string(),
                index,
                value,
            })?;
        }

        Ok(Self(rgb))
    }

    pub const fn red(&self) -> u8 {
        self.0[0]
    }

    pub const fn green(&self) -> u8 {
        self.0[1]
    }

    pub const fn blue(&self) -> u8 {
        self.0[2]
    }

    /// Components in red-green-blue order.
    pub const fn rgb(&self) -> [u8; 3] {
        self.0
    }

    /// Exchange the first two components (RGB <-> GRB).
    pub const fn swapped(&self) -> Self {
        Self([self.0[1], self.0[0], self.0[2]])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<Vec<i64>> for Color {
    type Error = ValidationError;

    fn try_from(components: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_components(&components)
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red(), self.green(), self.blue())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Device configuration bundle.
///
/// Created by the caller. While the feedback loop runs, only the controller
/// writes `fan_speed` and `pump_speed`.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub mode: LightingMode,
    pub colors: [Color; MAX_COLORS],
    /// Number of leading entries of `colors` in use (1-8).
    pub color_count: usize,
    pub text_color: Color,
    /// Animation speed (0-4).
    pub animation_speed: u8,
    /// Fan duty percentage (25-100).
    pub fan_speed: u8,
    /// Pump duty percentage (60-100).
    pub pump_speed: u8,
    /// Drive fan/pump from the CPU temperature instead of fixed speeds.
    pub sensor_control: bool,
    /// Temperature ceiling used by the feedback loop (30-85°C).
    pub max_safe_temp: u8,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            mode: LightingMode::Solid,
            colors: [Color::DEFAULT; MAX_COLORS],
            color_count: 1,
            text_color: Color::DEFAULT,
            animation_speed: 0,
            fan_speed: 30,
            pump_speed: 60,
            sensor_control: false,
            max_safe_temp: 80,
        }
    }
}

impl Configuration {
    /// Check every field against its bounds.
    ///
    /// This is the gate in front of every device write and every feedback
    /// cycle.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range(
            "Animation speed",
            self.animation_speed,
            ANIMATION_SPEED_RANGE,
        )?;
        check_range("Fan speed", self.fan_speed, FAN_SPEED_RANGE)?;
        check_range("Pump speed", self.pump_speed, PUMP_SPEED_RANGE)?;
        check_range(
            "Maximum safe temperature",
            self.max_safe_temp,
            MAX_SAFE_TEMP_RANGE,
        )?;

        let (min, max) = COLOR_COUNT_RANGE;
        if self.color_count < min || self.color_count > max {
            return Err(ValidationError::OutOfRange {
                field: "Color count",
                value: i64::try_from(self.color_count).unwrap_or(i64::MAX),
                min: min as i64,
                max: max as i64,
            });
        }

        // Text color first, then the active slots.
        Color::checked("Text color", &widen(self.text_color))?;
        for (i, color) in self.active_colors().iter().enumerate() {
            Color::checked(&format!("Color {i}"), &widen(*color))?;
        }

        Ok(())
    }

    /// The colors currently in use (`colors[..color_count]`).
    ///
    /// Clamped to the slot count so an unvalidated count never panics.
    pub fn active_colors(&self) -> &[Color] {
        &self.colors[..self.color_count.min(MAX_COLORS)]
    }

    /// Replace the color slots from a list, filling the rest with the default.
    pub fn set_colors(&mut self, colors: &[Color]) -> Result<(), ValidationError> {
        if colors.len() > MAX_COLORS {
            return Err(ValidationError::OutOfRange {
                field: "Number of colors",
                value: colors.len() as i64,
                min: 0,
                max: MAX_COLORS as i64,
            });
        }

        self.colors = [Color::DEFAULT; MAX_COLORS];
        self.colors[..colors.len()].copy_from_slice(colors);
        Ok(())
    }
}

fn check_range(field: &'static str, value: u8, (min, max): (u8, u8)) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(())
}

fn widen(color: Color) -> [i64; 3] {
    color.rgb().map(i64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn test_fan_speed_bounds() {
        let mut config = Configuration::default();
        config.fan_speed = 25;
        assert!(config.validate().is_ok());
        config.fan_speed = 100;
        assert!(config.validate().is_ok());
        config.fan_speed = 24;
        assert_eq!(
            config.validate(),
            Err(ValidationError::OutOfRange {
                field: "Fan speed",
                value: 24,
                min: 25,
                max: 100,
            })
        );
    }

    #[test]
    fn test_pump_speed_bounds() {
        let mut config = Configuration::default();
        config.pump_speed = 59;
        assert!(config.validate().is_err());
        config.pump_speed = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_animation_speed_and_temp_bounds() {
        let mut config = Configuration::default();
        config.animation_speed = 5;
        assert!(config.validate().is_err());

        let mut config = Configuration::default();
        config.max_safe_temp = 29;
        assert!(config.validate().is_err());
        config.max_safe_temp = 86;
        assert!(config.validate().is_err());
        config.max_safe_temp = 85;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_color_count_bounds() {
        let mut config = Configuration::default();
        config.color_count = 0;
        assert!(config.validate().is_err());
        config.color_count = 9;
        assert!(config.validate().is_err());
        assert_eq!(config.active_colors().len(), MAX_COLORS);
        config.color_count = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_color_rejects_bad_input() {
        assert!(Color::from_components(&[255, 0, 0]).is_ok());
        assert!(matches!(
            Color::from_components(&[255, 0]),
            Err(ValidationError::ColorArity { len: 2, .. })
        ));
        assert!(matches!(
            Color::from_components(&[0, 256, 0]),
            Err(ValidationError::ColorComponent {
                index: 1,
                value: 256,
                ..
            })
        ));
        assert!(Color::from_components(&[-1, 0, 0]).is_err());
    }

    #[test]
    fn test_color_swap() {
        let color = Color::new(1, 2, 3);
        assert_eq!(color.swapped().rgb(), [2, 1, 3]);
        assert_eq!(color.swapped().swapped(), color);
    }

    #[test]
    fn test_color_display() {
        let color = Color::new(0x12, 0xAB, 0x0F);
        assert_eq!((color.red(), color.green(), color.blue()), (0x12, 0xAB, 0x0F));
        assert_eq!(color.to_string(), "#12AB0F");
    }

    #[test]
    fn test_color_serde() {
        let color: Color = serde_json::from_str("[0, 128, 255]").unwrap();
        assert_eq!(color, Color::new(0, 128, 255));
        assert!(serde_json::from_str::<Color>("[0, 128]").is_err());
        assert!(serde_json::from_str::<Color>("[0, 128, 300]").is_err());
        assert_eq!(serde_json::to_string(&color).unwrap(), "[0,128,255]");
    }

    #[test]
    fn test_set_colors_fills_default() {
        let mut config = Configuration::default();
        config
            .set_colors(&[Color::new(0, 0, 255), Color::new(0, 255, 0)])
            .unwrap();
        assert_eq!(config.colors[1], Color::new(0, 255, 0));
        assert_eq!(config.colors[2], Color::DEFAULT);
        assert!(config.set_colors(&[Color::DEFAULT; 9]).is_err());
    }
}
