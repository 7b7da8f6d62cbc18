//! Raw endpoint access used by the device handle.

use crate::error::TransportError;

/// Command (OUT) endpoint.
pub const ENDPOINT_OUT: u8 = 0x01;

/// Status (IN) endpoint.
pub const ENDPOINT_IN: u8 = 0x81;

/// Minimal transport the driver needs: write a frame, read a report.
///
/// Implementations own the USB connection. No timeouts or retries are
/// applied on top of what the implementation does.
pub trait DeviceChannel {
    /// Write `data` to `endpoint`.
    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError>;

    /// Read up to `max_length` bytes from `endpoint`.
    fn read(&mut self, endpoint: u8, max_length: usize) -> Result<Vec<u8>, TransportError>;
}

impl<C: DeviceChannel + ?Sized> DeviceChannel for &mut C {
    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(endpoint, data)
    }

    fn read(&mut self, endpoint: u8, max_length: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(endpoint, max_length)
    }
}

impl<C: DeviceChannel + ?Sized> DeviceChannel for Box<C> {
    fn write(&mut self, endpoint: u8, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(endpoint, data)
    }

    fn read(&mut self, endpoint: u8, max_length: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(endpoint, max_length)
    }
}
