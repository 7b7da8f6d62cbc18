//! USB command definitions and frame builders for the Kraken X52.
//!
//! Every outbound frame is derived from a validated [`Configuration`]; the
//! byte layouts here are the device's wire format and must match exactly.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{Color, Configuration, MAX_COLORS};
use crate::error::{KrakenError, Result, ValidationError};

// =============================================================================
// Constants
// =============================================================================

/// NZXT Vendor ID.
pub const NZXT_VID: u16 = 0x1E71;

/// Kraken X52 Product ID.
pub const KRAKEN_X52_PID: u16 = 0x170E;

/// Length of every lighting frame.
pub const COLOR_FRAME_LENGTH: usize = 32;

/// Length of a fan or pump speed frame.
pub const SPEED_FRAME_LENGTH: usize = 5;

/// Number of ring slots following the leading color.
pub const RING_SLOTS: usize = 8;

/// Number of default colors carried by a spectrum wave frame.
pub const SPECTRUM_WAVE_SLOTS: usize = 9;

/// Step added to the second mode byte per chained color.
/// The upper 3 bits of that byte carry the color position.
pub const COLOR_POSITION_STEP: u8 = 16 * 2;

// =============================================================================
// Commands
// =============================================================================

/// Lighting command prefix: [0x02, 0x4c, 0x00].
pub const CMD_SET_COLOR_HEADER: [u8; 3] = [0x02, 0x4C, 0x00];

/// Speed command header: [0x02, 0x4d, channel].
pub const CMD_SET_SPEED_HEADER: [u8; 2] = [0x02, 0x4D];

/// A frame sent to the command endpoint.
pub type Frame = Vec<u8>;

// =============================================================================
// Lighting Modes
// =============================================================================

/// Supported lighting modes.
///
/// Each variant carries its protocol (opcode, channel class) byte pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightingMode {
    Solid,
    SolidAll,
    Breathing,
    Pulse,
    Fading,
    CoveringMarquee,
    SpectrumWave,
}

impl LightingMode {
    /// Every mode the device understands.
    pub const ALL: [LightingMode; 7] = [
        LightingMode::Solid,
        LightingMode::SolidAll,
        LightingMode::Breathing,
        LightingMode::Pulse,
        LightingMode::Fading,
        LightingMode::CoveringMarquee,
        LightingMode::SpectrumWave,
    ];

    /// Protocol (opcode, channel class) pair.
    pub const fn mode_bytes(&self) -> [u8; 2] {
        match self {
            LightingMode::Solid => [0x00, 0x02],
            LightingMode::SolidAll => [0x00, 0x02],
            LightingMode::Breathing => [0x06, 0x02],
            LightingMode::Pulse => [0x07, 0x02],
            LightingMode::Fading => [0x01, 0x02],
            LightingMode::CoveringMarquee => [0x04, 0x02],
            LightingMode::SpectrumWave => [0x02, 0x01],
        }
    }

    /// Get mode name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            LightingMode::Solid => "Solid",
            LightingMode::SolidAll => "SolidAll",
            LightingMode::Breathing => "Breathing",
            LightingMode::Pulse => "Pulse",
            LightingMode::Fading => "Fading",
            LightingMode::CoveringMarquee => "CoveringMarquee",
            LightingMode::SpectrumWave => "SpectrumWave",
        }
    }

    /// Whether the mode sends one frame per active color.
    pub const fn is_chained(&self) -> bool {
        matches!(
            self,
            LightingMode::Breathing
                | LightingMode::Pulse
                | LightingMode::Fading
                | LightingMode::CoveringMarquee
        )
    }
}

impl std::fmt::Display for LightingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LightingMode {
    type Err = ValidationError;

    /// Case-insensitive; `-`, `_` and spaces are ignored ("solid-all").
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        LightingMode::ALL
            .into_iter()
            .find(|mode| mode.name().to_lowercase() == key)
            .ok_or_else(|| ValidationError::UnknownMode(s.to_string()))
    }
}

// =============================================================================
// Speed Channels
// =============================================================================

/// Speed control channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Fan,
    Pump,
}

impl Channel {
    /// Channel selector byte following [`CMD_SET_SPEED_HEADER`].
    pub const fn id(&self) -> u8 {
        match self {
            Channel::Fan => 0x00,
            Channel::Pump => 0x40,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Fan => write!(f, "Fan"),
            Channel::Pump => write!(f, "Pump"),
        }
    }
}

// =============================================================================
// Frame Builders
// =============================================================================

/// Build the lighting frame(s) for the configured mode.
///
/// Solid, SolidAll and SpectrumWave produce one frame; the chained modes
/// produce one frame per active color.
///
/// # Errors
/// Returns `ProtocolInvariant` if a chained mode refers to a color slot that
/// does not exist (the validator rejects such configurations).
pub fn encode_color_frames(config: &Configuration) -> Result<Vec<Frame>> {
    let mode_bytes = config.mode.mode_bytes();

    let frames = match config.mode {
        LightingMode::Solid => {
            let color = config.colors[0];
            vec![color_frame(mode_bytes, color.swapped(), &[color; RING_SLOTS])]
        }
        LightingMode::SolidAll => {
            vec![color_frame(
                mode_bytes,
                config.text_color.swapped(),
                &config.colors,
            )]
        }
        LightingMode::SpectrumWave => {
            let mut frame = Vec::with_capacity(COLOR_FRAME_LENGTH);
            frame.extend_from_slice(&CMD_SET_COLOR_HEADER);
            // Animation speed takes the place of the channel class byte.
            frame.extend_from_slice(&[mode_bytes[0], config.animation_speed]);
            for _ in 0..SPECTRUM_WAVE_SLOTS {
                frame.extend_from_slice(&Color::DEFAULT.rgb());
            }
            vec![frame]
        }
        LightingMode::Breathing
        | LightingMode::Pulse
        | LightingMode::Fading
        | LightingMode::CoveringMarquee => (0..config.color_count)
            .map(|i| {
                let color = *config.colors.get(i).ok_or_else(|| {
                    KrakenError::ProtocolInvariant(format!(
                        "color index {i} outside the {MAX_COLORS} available slots"
                    ))
                })?;
                let position = u8::try_from(i)
                    .ok()
                    .and_then(|i| i.checked_mul(COLOR_POSITION_STEP))
                    .and_then(|offset| mode_bytes[1].checked_add(offset))
                    .ok_or_else(|| {
                        KrakenError::ProtocolInvariant(format!(
                            "color position {i} does not fit in the mode byte"
                        ))
                    })?;

                Ok(color_frame(
                    [mode_bytes[0], position],
                    color.swapped(),
                    &[color; RING_SLOTS],
                ))
            })
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(frames)
}

/// Header + mode bytes + leading (GRB) color + ring colors (RGB).
fn color_frame(mode_bytes: [u8; 2], leading: Color, ring: &[Color]) -> Frame {
    let mut frame = Vec::with_capacity(COLOR_FRAME_LENGTH);
    frame.extend_from_slice(&CMD_SET_COLOR_HEADER);
    frame.extend_from_slice(&mode_bytes);
    frame.extend_from_slice(&leading.rgb());
    for color in ring {
        frame.extend_from_slice(&color.rgb());
    }
    frame
}

/// Build a fixed speed command.
///
/// Format: [0x02, 0x4d, channel, 0x00, duty]
pub fn build_speed_cmd(channel: Channel, duty: u8) -> [u8; SPEED_FRAME_LENGTH] {
    [
        CMD_SET_SPEED_HEADER[0],
        CMD_SET_SPEED_HEADER[1],
        channel.id(),
        0x00,
        duty,
    ]
}

/// Fan speed frame for the configured fan duty.
pub fn encode_fan_frame(config: &Configuration) -> [u8; SPEED_FRAME_LENGTH] {
    build_speed_cmd(Channel::Fan, config.fan_speed)
}

/// Pump speed frame for the configured pump duty.
pub fn encode_pump_frame(config: &Configuration) -> [u8; SPEED_FRAME_LENGTH] {
    build_speed_cmd(Channel::Pump, config.pump_speed)
}
