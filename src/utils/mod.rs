pub mod parsing;
pub mod sensors;

// Re-export commonly used items
pub use sensors::{
    HostSensors, LmSensors, SensorBackend, SensorInfo, SystemSensors, TemperatureSource,
};
