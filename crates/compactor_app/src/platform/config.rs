use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use compactor_core::{Codec, CompressOptions, Quality, Resolution, Timings};
use compactor_engine::{AtomicFileWriter, ClientSettings, PersistError};
use compactor_logging::compactor_info;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::cli::Cli;
use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "compactor.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid {field} '{value}' in config")]
    InvalidValue { field: &'static str, value: String },
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("failed to write config: {0}")]
    Write(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    pub output_dir: PathBuf,
    pub poll_interval_ms: u64,
    pub reset_delay_ms: u64,
    pub highlight_ms: u64,
    pub connect_timeout_secs: u64,
    pub start_timeout_secs: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub quality: Quality,
    pub codec: Codec,
    pub resolution: Resolution,
    pub ring_radius: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let timings = Timings::default();
        let options = CompressOptions::default();
        Self {
            server_url: client.base_url,
            output_dir: PathBuf::from("downloads"),
            poll_interval_ms: timings.poll_interval.as_millis() as u64,
            reset_delay_ms: timings.reset_delay.as_millis() as u64,
            highlight_ms: timings.highlight.as_millis() as u64,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            start_timeout_secs: client.start_timeout.as_secs(),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            quality: options.quality,
            codec: options.codec,
            resolution: options.resolution,
            ring_radius: 54.0,
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        compactor_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(self, pretty)
            .map_err(|err| ConfigError::Serialize(err.to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILENAME.to_string());
        Ok(AtomicFileWriter::new(dir).write(&filename, content.as_bytes())?)
    }

    /// Command-line flags take precedence over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server_url = server.clone();
        }
        if let Some(output) = &cli.output {
            self.output_dir = output.clone();
        }
        if let Some(quality) = cli.quality {
            self.quality = quality;
        }
        if let Some(codec) = cli.codec {
            self.codec = codec;
        }
        if let Some(resolution) = cli.resolution {
            self.resolution = resolution;
        }
        if cli.verbose {
            self.log_level = "debug".to_string();
            self.log_destination = LogDestination::Both;
        }
    }

    pub fn options(&self) -> CompressOptions {
        CompressOptions {
            quality: self.quality,
            codec: self.codec,
            resolution: self.resolution,
        }
    }

    pub fn level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| ConfigError::InvalidValue {
            field: "log_level",
            value: self.log_level.clone(),
        })
    }

    pub fn timings(&self) -> Timings {
        Timings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            highlight: Duration::from_millis(self.highlight_ms),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.server_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            start_timeout: Duration::from_secs(self.start_timeout_secs),
        }
    }
}
