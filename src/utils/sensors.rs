//! Host temperature sensor sources.
//!
//! The feedback loop reads one named channel (e.g. `CPUTIN`) from a
//! [`TemperatureSource`]. Two sources are provided: the `sensors` utility from
//! lm-sensors, and `sysinfo` components keyed by label.

use std::collections::HashMap;
use std::process::Command;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sysinfo::Components;
use tracing::trace;

use crate::error::{SensorError, ValidationError};

/// `LABEL:   +45.0°C  (high = ...)`
static SENSOR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(.*?):\s+\+?(.*?)°C").expect("sensor line pattern is valid")
});

// =============================================================================
// Temperature Source
// =============================================================================

/// Anything that can report named temperatures in Celsius.
///
/// Closures returning a map are sources too, which keeps the controller
/// testable without real hardware.
pub trait TemperatureSource {
    /// Read every channel the source knows about.
    fn read_temperatures(&mut self) -> Result<HashMap<String, f64>, SensorError>;

    /// Read a single channel by name.
    fn read_named_temperature(&mut self, channel: &str) -> Result<f64, SensorError> {
        self.read_temperatures()?
            .get(channel)
            .copied()
            .ok_or_else(|| SensorError::ChannelNotFound(channel.to_string()))
    }
}

impl<F> TemperatureSource for F
where
    F: FnMut() -> Result<HashMap<String, f64>, SensorError>,
{
    fn read_temperatures(&mut self) -> Result<HashMap<String, f64>, SensorError> {
        self()
    }
}

// =============================================================================
// lm-sensors
// =============================================================================

/// Reads temperatures by running the `sensors` command.
#[derive(Debug, Clone)]
pub struct LmSensors {
    program: String,
}

impl LmSensors {
    pub fn new() -> Self {
        Self {
            program: "sensors".to_string(),
        }
    }

    /// Use a different executable (e.g. an absolute path).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LmSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl LmSensors {
    /// Run the command and return its standard output.
    fn run(&self) -> Result<String, SensorError> {
        let output = Command::new(&self.program)
            .output()
            .map_err(|e| SensorError::CommandFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(SensorError::CommandFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TemperatureSource for LmSensors {
    fn read_temperatures(&mut self) -> Result<HashMap<String, f64>, SensorError> {
        Ok(parse_sensors_output(&self.run()?))
    }

    fn read_named_temperature(&mut self, channel: &str) -> Result<f64, SensorError> {
        parse_named_temperature(&self.run()?, channel)
    }
}

/// Every `°C` line as (label, parsed value).
fn sensor_readings(output: &str) -> impl Iterator<Item = (String, Result<f64, SensorError>)> + '_ {
    SENSOR_LINE.captures_iter(output).map(|caps| {
        let label = caps[1].trim().to_string();
        let raw = caps[2].trim();
        let value = raw.parse::<f64>().map_err(|_| SensorError::Unparsable {
            label: label.clone(),
            value: raw.to_string(),
        });
        (label, value)
    })
}

/// Parse `sensors` output into a label -> Celsius map.
///
/// Lines without a `°C` reading are ignored, and so are readings that are
/// not a number (e.g. `N/A`).
pub fn parse_sensors_output(output: &str) -> HashMap<String, f64> {
    sensor_readings(output)
        .filter_map(|(label, value)| match value {
            Ok(value) => {
                trace!(%label, value, "Parsed sensor reading");
                Some((label, value))
            }
            Err(e) => {
                trace!(%label, error = %e, "Skipping sensor reading");
                None
            }
        })
        .collect()
}

/// Read one channel from `sensors` output.
///
/// Only the requested channel has to parse. When a label repeats, the last
/// reading wins.
pub fn parse_named_temperature(output: &str, channel: &str) -> Result<f64, SensorError> {
    sensor_readings(output)
        .filter(|(label, _)| label == channel)
        .last()
        .map(|(_, value)| value)
        .unwrap_or_else(|| Err(SensorError::ChannelNotFound(channel.to_string())))
}

// =============================================================================
// System Sensors
// =============================================================================

/// Information about a detected sensor.
#[derive(Debug, Clone)]
pub struct SensorInfo {
    /// Sensor label/name.
    pub label: String,
    /// Current temperature in Celsius.
    pub temperature: Option<f32>,
    /// Critical temperature threshold (if available).
    pub critical: Option<f32>,
}

impl std::fmt::Display for SensorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let temperature = self
            .temperature
            .map(|t| format!("{:.1}°C", t))
            .unwrap_or_else(|| "-".to_string());
        let critical = self
            .critical
            .map(|c| format!("{:.1}°C", c))
            .unwrap_or_else(|| "-".to_string());

        write!(f, "{:<40} | {:<10} | {}", self.label, temperature, critical)
    }
}

/// Wrapper for `sysinfo` component access.
pub struct SystemSensors {
    components: Components,
}

impl SystemSensors {
    /// Create a new SystemSensors instance with refreshed sensor list.
    pub fn new() -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
        }
    }

    /// Refresh all sensor values.
    pub fn refresh(&mut self) {
        self.components.refresh(true);
    }

    /// Get the total number of detected sensors.
    pub fn count(&self) -> usize {
        self.components.len()
    }

    /// Get all detected sensors as a list of SensorInfo.
    pub fn list_all(&self) -> Vec<SensorInfo> {
        self.components
            .iter()
            .map(|c| SensorInfo {
                label: c.label().to_string(),
                temperature: c.temperature(),
                critical: c.critical(),
            })
            .collect()
    }
}

impl Default for SystemSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureSource for SystemSensors {
    fn read_temperatures(&mut self) -> Result<HashMap<String, f64>, SensorError> {
        self.refresh();

        Ok(self
            .components
            .iter()
            .filter_map(|c| Some((c.label().to_string(), f64::from(c.temperature()?))))
            .collect())
    }
}

impl std::fmt::Debug for SystemSensors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSensors")
            .field("count", &self.count())
            .finish()
    }
}

// =============================================================================
// Backend Selection
// =============================================================================

/// Which host sensor source the feedback loop samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorBackend {
    /// The `sensors` command.
    #[default]
    LmSensors,
    /// `sysinfo` components.
    Sysinfo,
}

impl SensorBackend {
    pub fn name(&self) -> &'static str {
        match self {
            SensorBackend::LmSensors => "lm-sensors",
            SensorBackend::Sysinfo => "sysinfo",
        }
    }

    /// Create the source for this backend.
    pub fn open(self) -> HostSensors {
        match self {
            SensorBackend::LmSensors => HostSensors::LmSensors(LmSensors::new()),
            SensorBackend::Sysinfo => HostSensors::System(SystemSensors::new()),
        }
    }
}

impl std::fmt::Display for SensorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorBackend {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lm-sensors" | "lm_sensors" | "lmsensors" | "sensors" => Ok(SensorBackend::LmSensors),
            "sysinfo" | "system" => Ok(SensorBackend::Sysinfo),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown sensor backend '{}'. Use: lm-sensors or sysinfo",
                s
            ))),
        }
    }
}

/// Either built-in source, chosen at runtime.
#[derive(Debug)]
pub enum HostSensors {
    LmSensors(LmSensors),
    System(SystemSensors),
}

impl HostSensors {
    /// Every sensor the backend reports, sorted by label.
    ///
    /// Critical thresholds are only known to `sysinfo`.
    pub fn list_all(&mut self) -> Result<Vec<SensorInfo>, SensorError> {
        let mut sensors: Vec<SensorInfo> = match self {
            HostSensors::LmSensors(source) => source
                .read_temperatures()?
                .into_iter()
                .map(|(label, temperature)| SensorInfo {
                    label,
                    temperature: Some(temperature as f32),
                    critical: None,
                })
                .collect(),
            HostSensors::System(source) => {
                source.refresh();
                source.list_all()
            }
        };

        sensors.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(sensors)
    }
}

impl TemperatureSource for HostSensors {
    fn read_temperatures(&mut self) -> Result<HashMap<String, f64>, SensorError> {
        match self {
            HostSensors::LmSensors(source) => source.read_temperatures(),
            HostSensors::System(source) => source.read_temperatures(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
nct6779-isa-0290
Adapter: ISA adapter
Vcore:         +0.90 V  (min =  +0.00 V, max =  +1.74 V)
fan2:          836 RPM  (min =    0 RPM)
SYSTIN:        +33.0°C  (high =  +0.0°C, hyst =  +0.0°C)  ALARM  sensor = thermistor
CPUTIN:        +45.5°C  (high = +80.0°C, hyst = +75.0°C)  sensor = thermistor
AUXTIN0:       -62.0°C  sensor = thermistor

k10temp-pci-00c3
Adapter: PCI adapter
Tctl:         +52.8°C
";

    #[test]
    fn test_parse_sensors_output() {
        let temps = parse_sensors_output(SAMPLE);
        assert_eq!(temps.len(), 4);
        assert_eq!(temps.get("CPUTIN"), Some(&45.5));
        assert_eq!(temps.get("SYSTIN"), Some(&33.0));
        assert_eq!(temps.get("AUXTIN0"), Some(&-62.0));
        assert_eq!(temps.get("Tctl"), Some(&52.8));
        assert!(!temps.contains_key("fan2"));
    }

    #[test]
    fn test_unparsable_line_skipped() {
        let output = "SYSTIN:  +N/A°C\nCPUTIN:  +47.0°C  (high = +80.0°C)\n";
        let temps = parse_sensors_output(output);
        assert_eq!(temps.len(), 1);
        assert_eq!(temps.get("CPUTIN"), Some(&47.0));
        assert_eq!(parse_named_temperature(output, "CPUTIN").unwrap(), 47.0);
    }

    #[test]
    fn test_named_unparsable_value() {
        let result = parse_named_temperature("CPUTIN:  +N/A°C\n", "CPUTIN");
        assert!(matches!(
            result,
            Err(SensorError::Unparsable { ref label, .. }) if label == "CPUTIN"
        ));
        assert!(matches!(
            parse_named_temperature(SAMPLE, "PECI"),
            Err(SensorError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_closure_source() {
        let mut source = || -> Result<HashMap<String, f64>, SensorError> {
            Ok(HashMap::from([("CPUTIN".to_string(), 51.0)]))
        };
        assert_eq!(source.read_named_temperature("CPUTIN").unwrap(), 51.0);
        assert!(matches!(
            source.read_named_temperature("SYSTIN"),
            Err(SensorError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_missing_program() {
        let mut source = LmSensors::with_program("/nonexistent/krakenx-sensors");
        assert!(matches!(
            source.read_temperatures(),
            Err(SensorError::CommandFailed(_))
        ));
    }

    #[test]
    fn test_sensor_backend_names() {
        assert_eq!("lm-sensors".parse::<SensorBackend>().unwrap(), SensorBackend::LmSensors);
        assert_eq!("SYSINFO".parse::<SensorBackend>().unwrap(), SensorBackend::Sysinfo);
        assert!("acpi".parse::<SensorBackend>().is_err());
        assert_eq!(SensorBackend::default(), SensorBackend::LmSensors);
        assert_eq!(
            serde_json::to_string(&SensorBackend::LmSensors).unwrap(),
            "\"lm-sensors\""
        );
    }

    #[test]
    fn test_sensor_info_display() {
        let info = SensorInfo {
            label: "Tctl".to_string(),
            temperature: Some(52.8),
            critical: Some(95.0),
        };
        assert_eq!(info.to_string(), format!("{:<40} | {:<10} | 95.0°C", "Tctl", "52.8°C"));

        let info = SensorInfo {
            label: "CPUTIN".to_string(),
            temperature: Some(45.5),
            critical: None,
        };
        assert!(info.to_string().ends_with("| -"));
    }

    #[test]
    fn test_host_sensors_list_all() {
        let mut host = SensorBackend::Sysinfo.open();
        let listed = host.list_all().unwrap();
        let HostSensors::System(ref system) = host else {
            panic!("expected sysinfo backend");
        };
        assert_eq!(listed.len(), system.count());
        assert!(listed.windows(2).all(|w| w[0].label <= w[1].label));

        let mut missing =
            HostSensors::LmSensors(LmSensors::with_program("/nonexistent/krakenx-sensors"));
        assert!(matches!(missing.list_all(), Err(SensorError::CommandFailed(_))));
    }

    #[test]
    fn test_system_sensors_creation() {
        let mut sensors = SystemSensors::new();
        // Actual sensors depend on the host; only check it doesn't fail.
        let _ = sensors.count();
        assert!(sensors.read_temperatures().is_ok());
    }
}
