//! # chronolex-settings
//!
//! Engine settings: compiled defaults, JSON file deep-merge, and
//! environment-variable overrides.
//!
//! Settings are loaded once at startup into an immutable value and
//! passed explicitly to each component — there is no process-wide
//! mutable configuration.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path};
pub use types::ChronolexSettings;
