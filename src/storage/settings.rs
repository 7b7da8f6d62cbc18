//! Settings file loading.
//!
//! Settings are read from a JSON file and merged with command-line flags.
//! The file is never written back.
//! Cross-platform: uses appropriate config directories for each OS.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::config::{Color, Configuration};
use crate::cooling::{DEFAULT_SENSOR_CHANNEL, SENSOR_DELAY};
use crate::error::{KrakenError, Result, ValidationError};
use crate::protocol::LightingMode;
use crate::utils::sensors::SensorBackend;

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "krakenx";
const CONFIG_FILE: &str = "config.json";

/// Allowed feedback interval in seconds.
pub const INTERVAL_SECS_RANGE: (u64, u64) = (1, 3600);

/// Get the configuration directory path.
/// - Linux: ~/.config/krakenx/
/// - Windows: %APPDATA%\krakenx\
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| KrakenError::InvalidSettings("Could not find config directory".into()))
}

/// Get the full path to the default settings file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// Settings
// =============================================================================

/// Everything the CLI needs to build a [`Configuration`] and a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lighting mode name, e.g. "solid-all".
    #[serde(deserialize_with = "deserialize_mode")]
    pub mode: LightingMode,

    /// Up to 8 `[r, g, b]` colors; missing slots use the default color.
    pub colors: Vec<Color>,

    /// Active colors; defaults to the number of `colors` given (at least 1).
    pub color_count: Option<usize>,

    pub text_color: Color,
    pub animation_speed: u8,
    pub fan_speed: u8,
    pub pump_speed: u8,
    pub sensor_control: bool,
    pub max_safe_temp: u8,

    /// Sensor channel sampled by the feedback loop.
    pub sensor_channel: String,

    /// Seconds between feedback cycles.
    pub interval_secs: u64,

    pub sensor_backend: SensorBackend,
}

impl Default for Settings {
    fn default() -> Self {
        let config = Configuration::default();
        Self {
            mode: config.mode,
            colors: Vec::new(),
            color_count: None,
            text_color: config.text_color,
            animation_speed: config.animation_speed,
            fan_speed: config.fan_speed,
            pump_speed: config.pump_speed,
            sensor_control: config.sensor_control,
            max_safe_temp: config.max_safe_temp,
            sensor_channel: DEFAULT_SENSOR_CHANNEL.to_string(),
            interval_secs: SENSOR_DELAY.as_secs(),
            sensor_backend: SensorBackend::default(),
        }
    }
}

fn deserialize_mode<'de, D>(deserializer: D) -> std::result::Result<LightingMode, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

impl Settings {
    /// Load settings.
    ///
    /// With `path`, the file must exist. Without it, the default location is
    /// used and a missing file means all defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = get_config_path()?;
                if !path.exists() {
                    debug!(path = %path.display(), "No settings file, using defaults");
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KrakenError::InvalidSettings(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let settings = Self::from_json(&content).map_err(|e| match e {
            KrakenError::InvalidSettings(msg) => {
                KrakenError::InvalidSettings(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse settings from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| KrakenError::InvalidSettings(format!("Failed to parse settings: {}", e)))
    }

    /// Time between feedback cycles.
    ///
    /// # Errors
    /// `interval_secs` outside 1-3600.
    pub fn interval(&self) -> std::result::Result<Duration, ValidationError> {
        let (min, max) = INTERVAL_SECS_RANGE;
        if self.interval_secs < min || self.interval_secs > max {
            return Err(ValidationError::OutOfRange {
                field: "Interval",
                value: i64::try_from(self.interval_secs).unwrap_or(i64::MAX),
                min: min as i64,
                max: max as i64,
            });
        }
        Ok(Duration::from_secs(self.interval_secs))
    }

    /// Build the device configuration.
    ///
    /// Rejects more than 8 colors. Field bounds are left to
    /// [`Configuration::validate`], which runs before any write.
    pub fn to_configuration(&self) -> std::result::Result<Configuration, ValidationError> {
        let mut config = Configuration {
            mode: self.mode,
            color_count: self.color_count.unwrap_or(self.colors.len().max(1)),
            text_color: self.text_color,
            animation_speed: self.animation_speed,
            fan_speed: self.fan_speed,
            pump_speed: self.pump_speed,
            sensor_control: self.sensor_control,
            max_safe_temp: self.max_safe_temp,
            ..Configuration::default()
        };
        config.set_colors(&self.colors)?;
        Ok(config)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.sensor_channel, "CPUTIN");
        assert_eq!(settings.interval(), Ok(Duration::from_secs(5)));
        assert_eq!(settings.to_configuration().unwrap(), Configuration::default());
    }

    #[test]
    fn test_full_settings() {
        let json = r#"{
            "mode": "covering-marquee",
            "colors": [[0, 0, 255], [0, 255, 0]],
            "text_color": [255, 255, 255],
            "animation_speed": 2,
            "fan_speed": 55,
            "pump_speed": 70,
            "sensor_control": true,
            "max_safe_temp": 75,
            "sensor_channel": "SYSTIN",
            "interval_secs": 2,
            "sensor_backend": "sysinfo"
        }"#;

        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.mode, LightingMode::CoveringMarquee);
        assert_eq!(settings.sensor_backend, SensorBackend::Sysinfo);

        let config = settings.to_configuration().unwrap();
        assert_eq!(config.color_count, 2);
        assert_eq!(config.colors[1], Color::new(0, 255, 0));
        assert_eq!(config.colors[2], Color::DEFAULT);
        assert_eq!(config.text_color, Color::new(255, 255, 255));
        assert!(config.sensor_control);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Settings::from_json(r#"{"mode": "rainbow"}"#).is_err());
        assert!(Settings::from_json(r#"{"colors": [[0, 0]]}"#).is_err());
        assert!(Settings::from_json(r#"{"text_color": [0, 0, 256]}"#).is_err());
        assert!(Settings::from_json(r#"{"sensor_control": "yes"}"#).is_err());
    }

    #[test]
    fn test_too_many_colors() {
        let settings = Settings {
            colors: vec![Color::DEFAULT; 9],
            ..Settings::default()
        };
        assert!(settings.to_configuration().is_err());
    }

    #[test]
    fn test_out_of_range_left_to_validation() {
        let settings = Settings::from_json(r#"{"fan_speed": 10}"#).unwrap();
        let config = settings.to_configuration().unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let settings = Settings::from_json(r#"{"interval_secs": 0}"#).unwrap();
        assert_eq!(
            settings.interval(),
            Err(ValidationError::OutOfRange {
                field: "Interval",
                value: 0,
                min: 1,
                max: 3600,
            })
        );

        let settings = Settings {
            interval_secs: u64::MAX,
            ..Settings::default()
        };
        assert!(matches!(
            settings.interval(),
            Err(ValidationError::OutOfRange { value: i64::MAX, .. })
        ));

        let settings = Settings {
            interval_secs: 3600,
            ..Settings::default()
        };
        assert_eq!(settings.interval(), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Settings::load(Some(Path::new("/nonexistent/krakenx/config.json")));
        assert!(matches!(result, Err(KrakenError::InvalidSettings(_))));
    }
}
