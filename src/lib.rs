//! KrakenX Library
//!
//! A Rust driver for the NZXT Kraken X52 liquid cooler.
//!
//! # Features
//!
//! - Lighting control (solid, breathing, pulse, fading, marquee, spectrum wave)
//! - Fixed fan and pump speeds
//! - Fan and pump speeds driven by the CPU temperature
//! - Read device status (liquid temperature, fan and pump RPM)
//!
//! # Example
//!
//! ```no_run
//! use krakenx::config::{Color, Configuration};
//! use krakenx::device::KrakenX52;
//! use krakenx::protocol::LightingMode;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut kraken = KrakenX52::open()?;
//!
//!     let mut config = Configuration {
//!         mode: LightingMode::Breathing,
//!         color_count: 2,
//!         fan_speed: 50,
//!         pump_speed: 80,
//!         ..Configuration::default()
//!     };
//!     config.set_colors(&[Color::new(0, 0, 255), Color::new(0, 255, 0)])?;
//!
//!     let status = kraken.apply(&config)?;
//!     println!("{}", status);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cooling;
pub mod device;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use config::{Color, Configuration};
pub use cooling::{FeedbackController, StopHandle};
pub use device::KrakenX52;
pub use error::{KrakenError, Result};
pub use protocol::{LightingMode, StatusReading};
