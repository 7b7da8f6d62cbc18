//! USB transport for the Kraken X52.
//!
//! This module uses `nusb` to claim the device's interface and exchange
//! frames with the command (0x01) and status (0x81) endpoints.

use futures_lite::future::block_on;
use nusb::transfer::RequestBuffer;
use tracing::debug;

use super::channel::DeviceChannel;
use crate::error::TransportError;
use crate::protocol::{KRAKEN_X52_PID, NZXT_VID};

/// Interface carrying both endpoints.
const INTERFACE: u8 = 0;

/// Summary of an attached device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDeviceSummary {
    pub bus_number: u8,
    pub address: u8,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

/// Handle for USB transfers to the Kraken.
pub struct UsbChannel {
    interface: nusb::Interface,
}

impl UsbChannel {
    /// Open the first attached Kraken X52 and claim its interface.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no matching device is attached.
    pub fn open() -> Result<Self, TransportError> {
        let device_info = nusb::list_devices()?
            .find(|d| d.vendor_id() == NZXT_VID && d.product_id() == KRAKEN_X52_PID)
            .ok_or(TransportError::DeviceNotFound)?;

        debug!(
            bus = device_info.bus_number(),
            address = device_info.device_address(),
            "Opening Kraken X52"
        );

        let device = device_info.open()?;
        let interface = device
            .claim_interface(INTERFACE)
            .map_err(|_| TransportError::InterfaceNotAvailable)?;

        Ok(Self { interface })
    }

    /// List all attached Kraken X52 devices.
    pub fn list_devices() -> Result<Vec<UsbDeviceSummary>, TransportError> {
        let devices = nusb::list_devices()?
            .filter(|d| d.vendor_id() == NZXT_VID && d.product_id() == KRAKEN_X52_PID)
            .map(|d| UsbDeviceSummary {
                bus_number: d.bus_number(),
                address: d.device_address(),
                product: d.product_string().map(String::from),
                serial_number: d.serial_number().map(String::from),
            })
            .collect();

        Ok(devices)
    }
}

impl DeviceChannel for UsbChannel {
    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError> {
        let completion = block_on(self.interface.bulk_out(endpoint, data.to_vec()));

        completion
            .status
            .map_err(|e| TransportError::Transfer {
                endpoint,
                message: e.to_string(),
            })
    }

    fn read(&mut self, endpoint: u8, max_length: usize) -> Result<Vec<u8>, TransportError> {
        let completion = block_on(
            self.interface
                .bulk_in(endpoint, RequestBuffer::new(max_length)),
        );

        completion
            .status
            .map_err(|e| TransportError::Transfer {
                endpoint,
                message: e.to_string(),
            })?;

        Ok(completion.data)
    }
}

impl std::fmt::Debug for UsbChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbChannel").finish_non_exhaustive()
    }
}
