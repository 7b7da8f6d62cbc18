//! NZXT Kraken X52 Control CLI
//!
//! Command-line interface for lighting, fan and pump control of the Kraken X52.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use krakenx::config::Color;
use krakenx::cooling::FeedbackController;
use krakenx::device::{KrakenX52, UsbChannel};
use krakenx::protocol::LightingMode;
use krakenx::storage::Settings;
use krakenx::utils::parsing::{parse_hex_color, parse_mode, parse_sensor_backend};
use krakenx::utils::sensors::SensorBackend;

// =============================================================================
// CLI Arguments
// =============================================================================

/// NZXT Kraken X52 Control Tool
#[derive(Parser, Debug)]
#[command(name = "krakenx-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: <config dir>/krakenx/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply lighting and speeds, or run the temperature feedback loop
    Update(UpdateArgs),

    /// Show current device status
    Status,

    /// List host temperature sensors
    Sensors {
        /// Sensor backend: lm-sensors or sysinfo
        #[arg(long, value_parser = parse_sensor_backend)]
        sensor_backend: Option<SensorBackend>,
    },

    /// List connected Kraken X52 devices
    List,
}

/// Overrides on top of the settings file.
#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// Lighting mode: solid, solid-all, breathing, pulse, fading,
    /// covering-marquee, spectrum-wave
    #[arg(long, value_parser = parse_mode)]
    mode: Option<LightingMode>,

    /// Ring color as hex (#RRGGBB), repeatable up to 8 times
    #[arg(long = "color", value_parser = parse_hex_color)]
    colors: Vec<Color>,

    /// Number of active colors (1-8)
    #[arg(long)]
    color_count: Option<usize>,

    /// Logo color as hex (#RRGGBB)
    #[arg(long, value_parser = parse_hex_color)]
    text_color: Option<Color>,

    /// Animation speed (0-4)
    #[arg(long)]
    animation_speed: Option<u8>,

    /// Fan duty percentage (25-100)
    #[arg(long)]
    fan_speed: Option<u8>,

    /// Pump duty percentage (60-100)
    #[arg(long)]
    pump_speed: Option<u8>,

    /// Drive fan and pump from the CPU temperature until Ctrl+C
    #[arg(long)]
    sensor_control: bool,

    /// Temperature ceiling for sensor control (30-85)
    #[arg(long)]
    max_safe_temp: Option<u8>,

    /// Sensor channel to sample
    #[arg(long)]
    sensor_channel: Option<String>,

    /// Seconds between feedback cycles (1-3600)
    #[arg(long)]
    interval: Option<u64>,

    /// Sensor backend: lm-sensors or sysinfo
    #[arg(long, value_parser = parse_sensor_backend)]
    sensor_backend: Option<SensorBackend>,
}

impl UpdateArgs {
    /// Apply flags on top of file settings.
    fn merge_into(self, settings: &mut Settings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if !self.colors.is_empty() {
            settings.colors = self.colors;
            if self.color_count.is_none() {
                settings.color_count = None;
            }
        }
        if let Some(count) = self.color_count {
            settings.color_count = Some(count);
        }
        if let Some(color) = self.text_color {
            settings.text_color = color;
        }
        if let Some(speed) = self.animation_speed {
            settings.animation_speed = speed;
        }
        if let Some(speed) = self.fan_speed {
            settings.fan_speed = speed;
        }
        if let Some(speed) = self.pump_speed {
            settings.pump_speed = speed;
        }
        if self.sensor_control {
            settings.sensor_control = true;
        }
        if let Some(temp) = self.max_safe_temp {
            settings.max_safe_temp = temp;
        }
        if let Some(channel) = self.sensor_channel {
            settings.sensor_channel = channel;
        }
        if let Some(secs) = self.interval {
            settings.interval_secs = secs;
        }
        if let Some(backend) = self.sensor_backend {
            settings.sensor_backend = backend;
        }
    }
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Update(update) => cmd_update(args.config, update),
        Command::Status => cmd_status(),
        Command::Sensors { sensor_backend } => cmd_sensors(args.config, sensor_backend),
        Command::List => cmd_list(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("krakenx={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    Settings::load(path.as_deref()).context("Failed to load settings")
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_update(config_path: Option<PathBuf>, update: UpdateArgs) -> Result<()> {
    let mut settings = load_settings(config_path)?;
    update.merge_into(&mut settings);
    debug!(?settings, "Merged settings");

    let mut config = settings
        .to_configuration()
        .context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;
    let interval = settings.interval().context("Invalid configuration")?;

    let mut controller = FeedbackController::new(settings.sensor_backend.open())
        .with_sensor_channel(settings.sensor_channel.clone())
        .with_interval(interval);

    if config.sensor_control {
        let stop = controller.stop_handle();
        ctrlc::set_handler(move || {
            stop.stop();
        })
        .context("Failed to set Ctrl+C handler")?;

        println!(
            "🌡️  Sensor control on {} (max {}°C, every {}s). Ctrl+C to stop.",
            settings.sensor_channel, config.max_safe_temp, settings.interval_secs
        );
    }

    let mut kraken = KrakenX52::open().context("Failed to open Kraken X52")?;
    info!(mode = %config.mode, colors = config.color_count, "Applying configuration");

    match kraken
        .update(&mut config, &mut controller)
        .context("Failed to update device")?
    {
        Some(status) => print!("{}", status),
        None => println!("\n👋 Sensor control stopped."),
    }

    Ok(())
}

fn cmd_status() -> Result<()> {
    let mut kraken = KrakenX52::open().context("Failed to open Kraken X52")?;
    let status = kraken.receive_status().context("Failed to read status")?;
    print!("{}", status);
    Ok(())
}

fn cmd_sensors(config_path: Option<PathBuf>, backend: Option<SensorBackend>) -> Result<()> {
    let settings = load_settings(config_path)?;
    let backend = backend.unwrap_or(settings.sensor_backend);

    println!("🔍 Reading sensors via {}...", backend);
    let sensors = backend
        .open()
        .list_all()
        .context("Failed to read sensors")?;

    if sensors.is_empty() {
        println!("❌ No sensors detected.");
        return Ok(());
    }

    println!("✅ Found {} sensors:\n", sensors.len());
    println!("   {:<40} | {:<10} | {}", "Label", "Temp", "Critical");
    println!("{}", "─".repeat(66));

    let mut selected = false;
    for sensor in &sensors {
        let prefix = if sensor.label == settings.sensor_channel {
            selected = true;
            "👉"
        } else {
            "  "
        };
        println!("{} {}", prefix, sensor);
    }

    println!("{}", "─".repeat(66));
    if selected {
        println!("👉 = Channel used by sensor control");
    } else {
        println!(
            "⚠️  Warning: channel '{}' is not reported by this backend.",
            settings.sensor_channel
        );
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    let devices = UsbChannel::list_devices().context("Failed to enumerate devices")?;

    if devices.is_empty() {
        println!("❌ No Kraken X52 devices found.");
        return Ok(());
    }

    println!("🔍 Found {} device(s):\n", devices.len());
    for (i, device) in devices.iter().enumerate() {
        let product = device.product.as_deref().unwrap_or("Kraken X52");
        let serial = device.serial_number.as_deref().unwrap_or("unknown");
        println!("  {}. {} (Serial: {})", i + 1, product, serial);
        println!("     Bus {:03} Device {:03}", device.bus_number, device.address);
    }

    Ok(())
}
