//! NZXT Kraken X52 device implementation.
//!
//! High-level interface for applying lighting and speed configuration and
//! reading telemetry.

use tracing::{debug, info};

use super::channel::{DeviceChannel, ENDPOINT_IN, ENDPOINT_OUT};
use super::usb::UsbChannel;
use crate::config::Configuration;
use crate::cooling::{FeedbackController, TemperatureSource};
use crate::error::{Result, TransportError};
use crate::protocol::{
    STATUS_REPORT_LENGTH, StatusReading, encode_color_frames, encode_fan_frame, encode_pump_frame,
};

// =============================================================================
// KrakenX52
// =============================================================================

/// NZXT Kraken X52 device handle.
///
/// Owns the [`DeviceChannel`] exclusively; every write goes through it.
///
/// # Example
///
/// ```no_run
/// use krakenx::config::Configuration;
/// use krakenx::device::KrakenX52;
///
/// let mut kraken = KrakenX52::open()?;
/// let config = Configuration {
///     fan_speed: 50,
///     pump_speed: 80,
///     ..Configuration::default()
/// };
///
/// let status = kraken.apply(&config)?;
/// println!("{}", status);
/// # Ok::<(), krakenx::error::KrakenError>(())
/// ```
pub struct KrakenX52<C: DeviceChannel> {
    channel: C,
}

impl KrakenX52<UsbChannel> {
    /// Open the first available Kraken X52 device.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no Kraken X52 is connected.
    pub fn open() -> Result<Self> {
        Ok(Self::new(UsbChannel::open()?))
    }
}

impl<C: DeviceChannel> KrakenX52<C> {
    /// Wrap an already opened channel.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Give the channel back.
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Apply a configuration.
    ///
    /// Always validates and sends the lighting frames. Without sensor control
    /// it then sends the fan and pump frames and returns one status reading.
    /// With sensor control it hands over to `controller` and only returns once
    /// the feedback loop has stopped, yielding `None`.
    pub fn update<S>(
        &mut self,
        config: &mut Configuration,
        controller: &mut FeedbackController<S>,
    ) -> Result<Option<StatusReading>>
    where
        C: Send,
        S: TemperatureSource + Send,
    {
        config.validate()?;
        self.send_color(config)?;

        if !config.sensor_control {
            self.send_fan_speed(config)?;
            self.send_pump_speed(config)?;
            return self.receive_status().map(Some);
        }

        info!("Starting sensor feedback loop");
        controller.run(self, config)?;
        Ok(None)
    }

    /// Apply a configuration with fixed speeds and read back the status.
    ///
    /// Same as [`update`](Self::update) with sensor control disabled.
    pub fn apply(&mut self, config: &Configuration) -> Result<StatusReading> {
        config.validate()?;
        self.send_color(config)?;
        self.send_fan_speed(config)?;
        self.send_pump_speed(config)?;
        self.receive_status()
    }

    /// Send the lighting frame(s) for the configured mode.
    pub fn send_color(&mut self, config: &Configuration) -> Result<()> {
        for frame in encode_color_frames(config)? {
            self.write(&frame)?;
        }
        Ok(())
    }

    /// Send the configured fan duty.
    pub fn send_fan_speed(&mut self, config: &Configuration) -> Result<()> {
        self.write(&encode_fan_frame(config))
    }

    /// Send the configured pump duty.
    pub fn send_pump_speed(&mut self, config: &Configuration) -> Result<()> {
        self.write(&encode_pump_frame(config))
    }

    /// Read and decode one status report.
    ///
    /// # Errors
    /// Returns `ShortRead` if the device returns fewer than 64 bytes.
    pub fn receive_status(&mut self) -> Result<StatusReading> {
        let raw = self.channel.read(ENDPOINT_IN, STATUS_REPORT_LENGTH)?;
        let got = raw.len();

        let report: [u8; STATUS_REPORT_LENGTH] =
            raw.try_into().map_err(|_| TransportError::ShortRead {
                endpoint: ENDPOINT_IN,
                expected: STATUS_REPORT_LENGTH,
                got,
            })?;

        Ok(StatusReading::decode(&report))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write(&mut self, data: &[u8]) -> Result<()> {
        debug!(endpoint = ENDPOINT_OUT, "Sending frame {:02x?}", data);
        self.channel.write(ENDPOINT_OUT, data)?;
        Ok(())
    }
}

impl<C: DeviceChannel> std::fmt::Debug for KrakenX52<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenX52").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use crate::protocol::LightingMode;

    #[derive(Default)]
    struct RecordingChannel {
        writes: Vec<(u8, Vec<u8>)>,
        report: Vec<u8>,
    }

    impl DeviceChannel for RecordingChannel {
        fn write(&mut self, endpoint: u8, data: &[u8]) -> std::result::Result<(), TransportError> {
            self.writes.push((endpoint, data.to_vec()));
            Ok(())
        }

        fn read(
            &mut self,
            _endpoint: u8,
            max_length: usize,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            Ok(self.report.iter().copied().take(max_length).collect())
        }
    }

    #[test]
    fn test_apply_sends_frames_in_order() {
        let mut report = vec![0u8; STATUS_REPORT_LENGTH];
        report[1] = 28;
        report[2] = 4;
        let mut kraken = KrakenX52::new(RecordingChannel {
            report,
            ..Default::default()
        });

        let mut config = Configuration::default();
        config.colors[0] = Color::new(0, 0, 255);

        let status = kraken.apply(&config).unwrap();
        assert!((status.liquid_temp_c - 28.4).abs() < 1e-4);

        let channel = kraken.into_inner();
        assert_eq!(channel.writes.len(), 3);
        assert!(channel.writes.iter().all(|(ep, _)| *ep == ENDPOINT_OUT));
        assert_eq!(channel.writes[1].1, vec![0x02, 0x4D, 0x00, 0x00, 30]);
        assert_eq!(channel.writes[2].1, vec![0x02, 0x4D, 0x40, 0x00, 60]);
    }

    #[test]
    fn test_invalid_config_sends_nothing() {
        let mut kraken = KrakenX52::new(RecordingChannel::default());
        let config = Configuration {
            mode: LightingMode::Fading,
            pump_speed: 20,
            ..Configuration::default()
        };

        assert!(kraken.apply(&config).is_err());
        assert!(kraken.into_inner().writes.is_empty());
    }

    #[test]
    fn test_short_status_read() {
        let mut kraken = KrakenX52::new(RecordingChannel {
            report: vec![0u8; 10],
            ..Default::default()
        });

        assert!(matches!(
            kraken.receive_status(),
            Err(crate::error::KrakenError::Transport(
                TransportError::ShortRead { got: 10, .. }
            ))
        ));
    }
}
