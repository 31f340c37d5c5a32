//! Configuration file parsing and validation.
//!
//! One TOML file describes the button input, the light output, the switch
//! mode, and optional level persistence. All range checks happen here, before
//! any hardware or the engine is constructed; a malformed configuration is
//! fatal at startup and never surfaces as a runtime fault.

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::engine::DimMode;
use crate::engine::EventMode;
use crate::engine::Mode;
use crate::engine::StepSign;

/// Default bounce time of the original switch service, in milliseconds.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("switch.dim_mode must be 0, 1 or 2, got {0}")]
    DimMode(u8),

    #[error("switch.event_mode must be 0, 1, 2 or 3, got {0}")]
    EventMode(u8),

    #[error("switch.levels must be at least 1")]
    Levels,

    #[error("switch.step must be 1 or -1, got {0}")]
    Step(i8),

    #[error("switch.exponent must be at least 1.0, got {0}")]
    Exponent(f64),

    #[error("switch.hold_secs is required when dim_mode is 2")]
    MissingHold,

    #[error("switch.hold_secs must be positive, got {0}")]
    Hold(f64),

    #[error("button.debounce_ms must be positive")]
    Debounce,
}

/// Top-level configuration structure.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub switch: SwitchConfig,
    pub button: ButtonConfig,
    pub light: LightConfig,
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Mode selectors and dim parameters, using the original service's numeric
/// selector values.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchConfig {
    /// 0 = on/off, 1 = press cycles dim levels, 2 = hold to dim.
    pub dim_mode: u8,

    /// 0 = press, 1 = release, 2 = press+release, 3 = release+press.
    pub event_mode: u8,

    /// Number of discrete non-zero brightness steps.
    #[serde(default = "default_levels")]
    pub levels: u32,

    /// Dimming direction, 1 or -1.
    #[serde(default = "default_step")]
    pub step: i8,

    /// Perceptual brightness correction exponent.
    #[serde(default = "default_exponent")]
    pub exponent: f64,

    /// Hold threshold and repeat cadence in seconds. Required for dim_mode 2.
    pub hold_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ButtonConfig {
    /// Sysfs GPIO value file to poll.
    pub value_path: PathBuf,

    /// Internal pull resistor: up, down, none or external.
    #[serde(default)]
    pub pull: Pull,

    /// Whether the pressed level is electrically low.
    #[serde(default)]
    pub active_low: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    #[default]
    Up,
    Down,
    None,
    External,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    /// Sysfs brightness or PWM duty file to write.
    pub brightness_path: PathBuf,

    /// The device's fully-on integer value.
    #[serde(default = "default_max_value")]
    pub max_value: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// File holding the persisted dim level.
    pub path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

fn default_levels() -> u32 {
    1
}

fn default_step() -> i8 {
    1
}

fn default_exponent() -> f64 {
    1.0
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_max_value() -> u32 {
    255
}

impl Config {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.mode()?;
        Ok(config)
    }

    /// Check every range constraint the mode resolver relies on and build
    /// the immutable mode from the validated values. Validation and
    /// construction are one operation so a mode can never be derived from
    /// settings that failed a check.
    pub fn mode(&self) -> Result<Mode, ConfigError> {
        let switch = &self.switch;

        let dim_mode =
            DimMode::try_from(switch.dim_mode).map_err(ConfigError::DimMode)?;
        let event_mode =
            EventMode::try_from(switch.event_mode).map_err(ConfigError::EventMode)?;
        let step = StepSign::try_from(switch.step).map_err(ConfigError::Step)?;

        if switch.levels == 0 {
            return Err(ConfigError::Levels);
        }
        if switch.exponent < 1.0 {
            return Err(ConfigError::Exponent(switch.exponent));
        }

        let hold = match (dim_mode, switch.hold_secs) {
            (DimMode::Hold, None) => return Err(ConfigError::MissingHold),
            (_, Some(secs)) if secs <= 0.0 => return Err(ConfigError::Hold(secs)),
            (DimMode::Hold, Some(secs)) => Some(Duration::from_secs_f64(secs)),
            _ => None,
        };

        if self.button.debounce_ms == 0 {
            return Err(ConfigError::Debounce);
        }

        Ok(Mode {
            dim_mode,
            event_mode,
            levels: switch.levels,
            step,
            exponent: switch.exponent,
            hold,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.button.debounce_ms)
    }
}
