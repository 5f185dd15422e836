//! Parsing and validation of device layout descriptions.
//!
//! A [`DeviceLayout`] tells the device model how long the configuration
//! image is, where each routing matrix keeps its selector words, how wide
//! a selector is, and which bits belong to the device itself. Layouts are
//! read from TOML or taken from a built-in preset.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod presets;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_layout, load_layout_from_str, validate_layout};
pub use types::*;
