//! Settings storage module.
//!
//! Locates and reads the JSON settings file.

pub mod settings;

pub use settings::{Settings, get_config_dir, get_config_path};
