//! Configuration loading and typed config structures for the distributor.
//!
//! The configuration lives in `gol-config.yaml` at the working directory.
//! Every section and field is optional; missing values take the defaults
//! below, which match the classic 512×512, 8-worker setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gol_types::Params;
use serde::Deserialize;

use crate::distributor::RunOptions;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GolConfig {
    /// Run parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Timer and timeout settings.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Image directories and I/O queue size.
    #[serde(default)]
    pub io: IoConfig,

    /// Channel capacities.
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GolConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for directories:
    /// - `GOL_IMAGES_DIR` overrides `io.images_dir`
    /// - `GOL_OUTPUT_DIR` overrides `io.output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.io.apply_env_overrides();
        Ok(config)
    }

    /// Run parameters for the distributor.
    pub const fn params(&self) -> Params {
        Params {
            turns: self.simulation.turns,
            threads: self.simulation.threads,
            image_width: self.simulation.image_width,
            image_height: self.simulation.image_height,
        }
    }

    /// Timer and timeout options for the distributor.
    ///
    /// A `worker_timeout_ms` of 0 disables the worker bound.
    pub const fn run_options(&self) -> RunOptions {
        let worker_timeout = if self.timing.worker_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timing.worker_timeout_ms))
        };
        RunOptions {
            progress_interval: Duration::from_millis(self.timing.progress_interval_ms),
            worker_timeout,
        }
    }
}

/// Run parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Number of turns to compute.
    #[serde(default = "default_turns")]
    pub turns: u64,

    /// Number of workers per turn.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Grid width in cells.
    #[serde(default = "default_image_size")]
    pub image_width: usize,

    /// Grid height in cells.
    #[serde(default = "default_image_size")]
    pub image_height: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            threads: default_threads(),
            image_width: default_image_size(),
            image_height: default_image_size(),
        }
    }
}

/// Timer and timeout settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Milliseconds between alive-cell reports.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Milliseconds to wait for every worker of a turn (0 = wait forever).
    #[serde(default = "default_worker_timeout_ms")]
    pub worker_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval_ms(),
            worker_timeout_ms: default_worker_timeout_ms(),
        }
    }
}

/// Image directories and I/O queue size.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IoConfig {
    /// Directory holding input images named `<width>x<height>.pgm`.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Directory snapshots are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Capacity of the I/O request queue.
    #[serde(default = "default_request_buffer")]
    pub request_buffer: usize,
}

impl IoConfig {
    /// Override directories with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GOL_IMAGES_DIR") {
            self.images_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GOL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            output_dir: default_output_dir(),
            request_buffer: default_request_buffer(),
        }
    }
}

/// Channel capacities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the event channel to the consumer.
    #[serde(default = "default_event_buffer")]
    pub buffer: usize,

    /// Capacity of the control token channel.
    #[serde(default = "default_control_buffer")]
    pub control_buffer: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer: default_event_buffer(),
            control_buffer: default_control_buffer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_turns() -> u64 {
    10_000_000_000
}

const fn default_threads() -> usize {
    8
}

const fn default_image_size() -> usize {
    512
}

const fn default_progress_interval_ms() -> u64 {
    2000
}

const fn default_worker_timeout_ms() -> u64 {
    30_000
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

const fn default_request_buffer() -> usize {
    16
}

const fn default_event_buffer() -> usize {
    1000
}

const fn default_control_buffer() -> usize {
    10
}

fn default_log_level() -> String {
    String::from("info")
}
