//! Optional user defaults file.
//!
//! `~/.dts2ac3.toml` is read once at startup and silently ignored when
//! absent. Keys use the same names as the long command-line flags; any
//! value it sets becomes the new default and is still overridable from
//! the command line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;

/// Filename of the defaults file inside the user's home directory.
pub const SETTINGS_FILE_NAME: &str = ".dts2ac3.toml";

/// Errors from reading the defaults file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Values loaded from the defaults file. Every field is optional; only
/// present keys override the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileSettings {
    pub all: Option<bool>,
    pub custom: Option<String>,
    pub default: Option<bool>,
    pub external: Option<bool>,
    pub force: Option<bool>,
    pub initial: Option<bool>,
    pub keep: Option<bool>,
    pub leave: Option<bool>,
    pub no_dts: Option<bool>,
    pub new: Option<bool>,
    pub track: Option<u64>,
    pub wd: Option<PathBuf>,
    pub aften: Option<Vec<String>>,
    pub dcadec: Option<Vec<String>>,
    pub color: Option<bool>,
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
}

impl FileSettings {
    /// Default location of the settings file, when a home directory
    /// can be determined.
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(SETTINGS_FILE_NAME))
    }

    /// Load settings from an explicit path. A missing file yields the
    /// empty settings; a present but malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings)
    }

    /// Load settings from the default location.
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
