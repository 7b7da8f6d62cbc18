//! Closed-loop fan/pump control from the host CPU temperature.
//!
//! Each cycle samples one named sensor channel, derives fan and pump duties
//! from how close the reading is to the configured safety ceiling, validates
//! the result and sends the speed frames. The loop runs on a background
//! thread while the caller's thread waits for a stop request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::device::{DeviceChannel, KrakenX52};
use crate::error::{KrakenError, Result, SensorError, ValidationError};
use crate::utils::sensors::TemperatureSource;

// =============================================================================
// Constants
// =============================================================================

/// Lowest fan duty the controller will ever request.
pub const MIN_AUTO_FAN_PERCENT: u8 = 40;

/// Computed fan duties are rounded up to a multiple of this.
pub const AUTO_ROUND_TO: u8 = 5;

/// Pump duty floor, applied on top of the fan duty.
pub const PUMP_FLOOR_PERCENT: u8 = 60;

pub const MAX_PERCENT: u8 = 100;

/// Time between control cycles.
pub const SENSOR_DELAY: Duration = Duration::from_secs(5);

/// How often the background task checks for a stop request while sleeping.
pub const SLEEP_GRANULARITY: Duration = Duration::from_millis(100);

/// How often the waiting caller checks for a stop request.
pub const SUPERVISOR_POLL: Duration = Duration::from_secs(1);

/// Sensor channel sampled by default.
pub const DEFAULT_SENSOR_CHANNEL: &str = "CPUTIN";

// =============================================================================
// Speed Computation
// =============================================================================

/// How close `current_temp` is to `max_safe_temp`, in percent.
///
/// 0% at 0°C, 100% at the ceiling, above 100% past it.
pub fn deviation_percent(max_safe_temp: u8, current_temp: f64) -> f64 {
    let max = f64::from(max_safe_temp);
    (1.0 - (max - current_temp) / max) * 100.0
}

/// Fan duty for a temperature: deviation rounded up to [`AUTO_ROUND_TO`],
/// clamped to [`MIN_AUTO_FAN_PERCENT`]-100.
pub fn fan_speed_for(max_safe_temp: u8, current_temp: f64) -> u8 {
    let step = f64::from(AUTO_ROUND_TO);
    let candidate = (deviation_percent(max_safe_temp, current_temp) / step).ceil() * step;

    candidate.clamp(f64::from(MIN_AUTO_FAN_PERCENT), f64::from(MAX_PERCENT)) as u8
}

/// Pump duty follows the (already clamped) fan duty, floored at 60%.
pub fn pump_speed_for(fan_speed: u8) -> u8 {
    fan_speed.clamp(PUMP_FLOOR_PERCENT, MAX_PERCENT)
}

/// Fan and pump duties computed in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedTargets {
    pub fan: u8,
    pub pump: u8,
}

impl SpeedTargets {
    pub fn compute(max_safe_temp: u8, current_temp: f64) -> Self {
        let fan = fan_speed_for(max_safe_temp, current_temp);
        let pump = pump_speed_for(fan);
        Self { fan, pump }
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Shared stop flag.
///
/// Clones refer to the same flag. Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Feedback Controller
// =============================================================================

/// Lifecycle of the feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "Idle"),
            ControllerState::Running => write!(f, "Running"),
            ControllerState::Stopping => write!(f, "Stopping"),
            ControllerState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Temperature-driven fan/pump controller.
///
/// # Example
///
/// ```no_run
/// use krakenx::config::Configuration;
/// use krakenx::cooling::FeedbackController;
/// use krakenx::device::KrakenX52;
/// use krakenx::utils::sensors::LmSensors;
///
/// let mut kraken = KrakenX52::open()?;
/// let mut config = Configuration {
///     sensor_control: true,
///     ..Configuration::default()
/// };
///
/// let mut controller = FeedbackController::new(LmSensors::new());
/// let stop = controller.stop_handle();
/// // Hand `stop` to a signal handler, then block until it fires.
/// kraken.update(&mut config, &mut controller)?;
/// # drop(stop);
/// # Ok::<(), krakenx::error::KrakenError>(())
/// ```
#[derive(Debug)]
pub struct FeedbackController<S> {
    source: S,
    sensor_channel: String,
    interval: Duration,
    sleep_granularity: Duration,
    supervisor_poll: Duration,
    stop: StopHandle,
    state: ControllerState,
}

impl<S: TemperatureSource> FeedbackController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            sensor_channel: DEFAULT_SENSOR_CHANNEL.to_string(),
            interval: SENSOR_DELAY,
            sleep_granularity: SLEEP_GRANULARITY,
            supervisor_poll: SUPERVISOR_POLL,
            stop: StopHandle::new(),
            state: ControllerState::Idle,
        }
    }

    /// Sample a different sensor channel.
    pub fn with_sensor_channel(mut self, channel: impl Into<String>) -> Self {
        self.sensor_channel = channel.into();
        self
    }

    /// Time between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Upper bound on shutdown latency while the loop sleeps.
    pub fn with_sleep_granularity(mut self, granularity: Duration) -> Self {
        self.sleep_granularity = granularity;
        self
    }

    /// How often the waiting caller checks the stop flag.
    pub fn with_supervisor_poll(mut self, poll: Duration) -> Self {
        self.supervisor_poll = poll;
        self
    }

    /// Use an externally created stop flag.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that requests shutdown of a running loop.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn sensor_channel(&self) -> &str {
        &self.sensor_channel
    }

    /// Run a single control cycle on the calling thread.
    pub fn step<C: DeviceChannel>(
        &mut self,
        device: &mut KrakenX52<C>,
        config: &mut Configuration,
    ) -> Result<SpeedTargets> {
        run_cycle(&mut self.source, &self.sensor_channel, device, config)
    }

    /// Run the feedback loop until a stop is requested or a cycle fails.
    ///
    /// The loop runs on a background thread that has exclusive use of
    /// `device` and `config`. This call blocks until that thread has exited,
    /// so no frame is sent after it returns.
    ///
    /// # Errors
    /// A zero interval is rejected before anything runs. After that, the
    /// first cycle error (sensor, validation or transport) ends the loop and
    /// is returned here.
    pub fn run<C>(&mut self, device: &mut KrakenX52<C>, config: &mut Configuration) -> Result<()>
    where
        C: DeviceChannel + Send,
        S: Send,
    {
        let Self {
            source,
            sensor_channel,
            interval,
            sleep_granularity,
            supervisor_poll,
            stop,
            state,
        } = self;

        if interval.is_zero() {
            return Err(ValidationError::OutOfRange {
                field: "Feedback interval (ms)",
                value: 0,
                min: 1,
                max: i64::MAX,
            }
            .into());
        }

        transition(state, ControllerState::Running);

        let outcome = thread::scope(|scope| {
            let worker = scope.spawn(|| {
                feedback_loop(
                    source,
                    sensor_channel,
                    device,
                    config,
                    stop,
                    *interval,
                    *sleep_granularity,
                )
            });

            while !stop.is_stopped() && !worker.is_finished() {
                thread::sleep(*supervisor_poll);
            }

            transition(state, ControllerState::Stopping);
            stop.stop();
            worker.join()
        });

        transition(state, ControllerState::Stopped);

        match outcome {
            Ok(result) => result,
            Err(_) => Err(KrakenError::ControllerPanicked),
        }
    }
}

fn transition(state: &mut ControllerState, next: ControllerState) {
    info!(from = %state, to = %next, "Feedback controller state changed");
    *state = next;
}

fn feedback_loop<S, C>(
    source: &mut S,
    sensor_channel: &str,
    device: &mut KrakenX52<C>,
    config: &mut Configuration,
    stop: &StopHandle,
    interval: Duration,
    granularity: Duration,
) -> Result<()>
where
    S: TemperatureSource,
    C: DeviceChannel,
{
    let mut cycles: u64 = 0;

    while !stop.is_stopped() {
        cycles += 1;
        if let Err(e) = run_cycle(source, sensor_channel, device, config) {
            warn!(cycle = cycles, error = %e, "Feedback cycle failed, stopping loop");
            return Err(e);
        }
        sleep_unless_stopped(stop, interval, granularity);
    }

    info!(cycles, "Shutting down sensor feedback loop");
    Ok(())
}

fn run_cycle<S, C>(
    source: &mut S,
    sensor_channel: &str,
    device: &mut KrakenX52<C>,
    config: &mut Configuration,
) -> Result<SpeedTargets>
where
    S: TemperatureSource,
    C: DeviceChannel,
{
    let current_temp = source.read_named_temperature(sensor_channel)?;
    if !current_temp.is_finite() {
        return Err(SensorError::NotFinite {
            channel: sensor_channel.to_string(),
            value: current_temp,
        }
        .into());
    }

    let targets = SpeedTargets::compute(config.max_safe_temp, current_temp);
    info!(
        cpu_temp_c = current_temp,
        fan_pct = targets.fan,
        pump_pct = targets.pump,
        "Computed speeds"
    );

    config.fan_speed = targets.fan;
    config.pump_speed = targets.pump;
    config.validate()?;

    device.send_fan_speed(config)?;
    device.send_pump_speed(config)?;

    Ok(targets)
}

/// Sleep for `interval`, waking every `granularity` to check `stop`.
/// An interval too large for the clock waits until `stop` is set.
fn sleep_unless_stopped(stop: &StopHandle, interval: Duration, granularity: Duration) {
    let deadline = Instant::now().checked_add(interval);

    loop {
        if stop.is_stopped() {
            debug!("Stop requested during sleep");
            return;
        }
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => granularity,
        };
        if remaining.is_zero() {
            return;
        }
        thread::sleep(remaining.min(granularity));
    }
}
