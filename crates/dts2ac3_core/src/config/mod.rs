//! Configuration resolution: built-in defaults, the optional user
//! defaults file, and command-line flags merged into one immutable
//! [`Options`] value.

pub mod file;
pub mod options;

pub use file::{FileSettings, SettingsError};
pub use options::{Options, RunMode, Validation};
