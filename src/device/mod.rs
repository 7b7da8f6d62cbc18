//! Device abstraction layer for NZXT Kraken X52 coolers.
//!
//! Provides the endpoint channel interface, the USB transport and the
//! high-level device handle.

pub mod channel;
pub mod kraken;
pub mod usb;

pub use channel::{DeviceChannel, ENDPOINT_IN, ENDPOINT_OUT};
pub use kraken::KrakenX52;
pub use usb::{UsbChannel, UsbDeviceSummary};
