//! Cooling control module.
//!
//! Provides the temperature-driven feedback controller for fan and pump duty.

mod controller;

pub use crate::utils::sensors::TemperatureSource;
pub use controller::{
    AUTO_ROUND_TO, ControllerState, DEFAULT_SENSOR_CHANNEL, FeedbackController, MAX_PERCENT,
    MIN_AUTO_FAN_PERCENT, PUMP_FLOOR_PERCENT, SENSOR_DELAY, SLEEP_GRANULARITY, SUPERVISOR_POLL,
    SpeedTargets, StopHandle, deviation_percent, fan_speed_for, pump_speed_for,
};
