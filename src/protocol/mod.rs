//! USB protocol implementation for the NZXT Kraken X52.
//!
//! This module contains the command constants, frame encoders for lighting
//! and speed control, and status report decoding.

pub mod commands;
pub mod status;

pub use commands::*;
pub use status::*;
