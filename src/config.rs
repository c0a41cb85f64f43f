// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exporter configuration.
//!
//! Values come from an optional TOML file and can each be overridden on the
//! command line. Every field has a default, so an empty file or no file at
//! all is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dump1090_client::{Position, ResourceError, ResourceSet, DEFAULT_FETCH_TIMEOUT};

use crate::aircraft::{SectorPolicy, DEFAULT_THRESHOLD_SECS};

/// Default dump1090 data location.
pub const DEFAULT_RESOURCE_PATH: &str = "http://localhost:8080/data";

/// Default exposition port.
pub const DEFAULT_PORT: u16 = 9105;

/// Fatal configuration problems, reported before anything starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: confy::ConfyError,
    },

    #[error("invalid resource path: {0}")]
    Resource(#[from] ResourceError),

    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),

    #[error("latitude and longitude must be given together")]
    PartialOrigin,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("fetch timeout must be a positive number of seconds, got {0}")]
    FetchTimeout(f64),

    #[error("aircraft threshold must be a positive number of seconds, got {0}")]
    Threshold(f64),
}

/// Exporter configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL or directory holding the dump1090 JSON documents
    #[serde(default = "default_resource_path")]
    pub resource_path: String,

    /// Address the metrics endpoint binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the metrics endpoint binds to (0 picks a free port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between aircraft updates
    #[serde(default = "default_aircraft_interval")]
    pub aircraft_interval: u64,

    /// Seconds between statistics updates
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,

    /// Seconds between receiver.json fetches while no origin is known
    #[serde(default = "default_receiver_interval")]
    pub receiver_interval: u64,

    /// Seconds between receiver.json fetches once an origin is known
    #[serde(default = "default_receiver_interval_origin_ok")]
    pub receiver_interval_origin_ok: u64,

    /// Fixed receiver latitude
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Fixed receiver longitude
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Seconds to wait for a response from dump1090
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: f64,

    /// Only aircraft seen within this many seconds are counted
    #[serde(default = "default_aircraft_threshold")]
    pub aircraft_threshold: f64,

    /// Clear per-sector range gauges every aircraft cycle
    #[serde(default)]
    pub reset_sectors: bool,

    /// Default log filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_resource_path() -> String {
    DEFAULT_RESOURCE_PATH.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_aircraft_interval() -> u64 {
    10
}

fn default_stats_interval() -> u64 {
    60
}

fn default_receiver_interval() -> u64 {
    10
}

fn default_receiver_interval_origin_ok() -> u64 {
    300
}

fn default_fetch_timeout() -> f64 {
    DEFAULT_FETCH_TIMEOUT.as_secs_f64()
}

fn default_aircraft_threshold() -> f64 {
    DEFAULT_THRESHOLD_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            resource_path: default_resource_path(),
            host: default_host(),
            port: default_port(),
            aircraft_interval: default_aircraft_interval(),
            stats_interval: default_stats_interval(),
            receiver_interval: default_receiver_interval(),
            receiver_interval_origin_ok: default_receiver_interval_origin_ok(),
            latitude: None,
            longitude: None,
            fetch_timeout: default_fetch_timeout(),
            aircraft_threshold: default_aircraft_threshold(),
            reset_sectors: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => confy::load_path(path).map_err(|source| ConfigError::Load {
                path: path.to_path_buf(),
                source,
            }),
            None => Ok(Self::default()),
        }
    }

    /// Reject configurations the exporter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ResourceSet::new(&self.resource_path)?;

        if let Some(latitude) = self.latitude {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(ConfigError::Latitude(latitude));
            }
        }
        if let Some(longitude) = self.longitude {
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(ConfigError::Longitude(longitude));
            }
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            return Err(ConfigError::PartialOrigin);
        }

        for (name, value) in [
            ("aircraft_interval", self.aircraft_interval),
            ("stats_interval", self.stats_interval),
            ("receiver_interval", self.receiver_interval),
            ("receiver_interval_origin_ok", self.receiver_interval_origin_ok),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroInterval(name));
            }
        }

        if !Duration::try_from_secs_f64(self.fetch_timeout).is_ok_and(|d| !d.is_zero()) {
            return Err(ConfigError::FetchTimeout(self.fetch_timeout));
        }
        if self.aircraft_threshold.is_nan() || self.aircraft_threshold <= 0.0 {
            return Err(ConfigError::Threshold(self.aircraft_threshold));
        }

        Ok(())
    }

    /// Fixed origin, when both coordinates are configured.
    #[must_use]
    pub fn origin(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position::new(latitude, longitude)),
            _ => None,
        }
    }

    #[must_use]
    pub fn aircraft_interval(&self) -> Duration {
        Duration::from_secs(self.aircraft_interval)
    }

    #[must_use]
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval)
    }

    #[must_use]
    pub fn receiver_interval(&self) -> Duration {
        Duration::from_secs(self.receiver_interval)
    }

    #[must_use]
    pub fn receiver_interval_origin_ok(&self) -> Duration {
        Duration::from_secs(self.receiver_interval_origin_ok)
    }

    /// Fetch timeout, falling back to the default for values `validate` rejects.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.fetch_timeout).unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }

    #[must_use]
    pub fn sector_policy(&self) -> SectorPolicy {
        SectorPolicy::from_reset_flag(self.reset_sectors)
    }
}

/// Command line flags. Every flag overrides the matching configuration value.
#[derive(Debug, Default, Parser)]
#[command(name = "dump1090-exporter", version, about = "Export dump1090 metrics to Prometheus")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL or directory holding the dump1090 JSON documents
    #[arg(long, value_name = "URL|DIR")]
    pub resource_path: Option<String>,

    /// Address the metrics endpoint binds to
    #[arg(long)]
    pub host: Option<String>,

    /// Port the metrics endpoint binds to
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds between aircraft updates
    #[arg(long, value_name = "SECS")]
    pub aircraft_interval: Option<u64>,

    /// Seconds between statistics updates
    #[arg(long, value_name = "SECS")]
    pub stats_interval: Option<u64>,

    /// Seconds between receiver.json fetches while no origin is known
    #[arg(long, value_name = "SECS")]
    pub receiver_interval: Option<u64>,

    /// Seconds between receiver.json fetches once an origin is known
    #[arg(long, value_name = "SECS")]
    pub receiver_interval_origin_ok: Option<u64>,

    /// Receiver latitude
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Receiver longitude
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Seconds to wait for a response from dump1090
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<f64>,

    /// Only aircraft seen within this many seconds are counted
    #[arg(long, value_name = "SECS")]
    pub aircraft_threshold: Option<f64>,

    /// Clear per-sector range gauges every aircraft cycle
    #[arg(long, overrides_with = "no_reset_sectors")]
    pub reset_sectors: bool,

    /// Keep per-sector range gauges for sectors with no aircraft
    #[arg(long, overrides_with = "reset_sectors")]
    pub no_reset_sectors: bool,

    /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Load the configuration file, if any, and apply the flags on top.
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let config = AppConfig::load(self.config.as_deref())?;
        Ok(self.apply(config))
    }

    fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(v) = self.resource_path {
            config.resource_path = v;
        }
        if let Some(v) = self.host {
            config.host = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.aircraft_interval {
            config.aircraft_interval = v;
        }
        if let Some(v) = self.stats_interval {
            config.stats_interval = v;
        }
        if let Some(v) = self.receiver_interval {
            config.receiver_interval = v;
        }
        if let Some(v) = self.receiver_interval_origin_ok {
            config.receiver_interval_origin_ok = v;
        }
        if let Some(v) = self.latitude {
            config.latitude = Some(v);
        }
        if let Some(v) = self.longitude {
            config.longitude = Some(v);
        }
        if let Some(v) = self.fetch_timeout {
            config.fetch_timeout = v;
        }
        if let Some(v) = self.aircraft_threshold {
            config.aircraft_threshold = v;
        }
        if self.reset_sectors {
            config.reset_sectors = true;
        }
        if self.no_reset_sectors {
            config.reset_sectors = false;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.resource_path, "http://localhost:8080/data");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9105);
        assert_eq!(config.aircraft_interval(), Duration::from_secs(10));
        assert_eq!(config.stats_interval(), Duration::from_secs(60));
        assert_eq!(config.receiver_interval(), Duration::from_secs(10));
        assert_eq!(config.receiver_interval_origin_ok(), Duration::from_secs(300));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(2));
        assert!((config.aircraft_threshold - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.sector_policy(), SectorPolicy::Retain);
        assert!(config.origin().is_none());
        config.validate().unwrap();
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dump1090-exporter-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = scratch_dir("partial");
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
resource_path = "/run/dump1090-fa"
latitude = -34.9
longitude = 138.6
reset_sectors = true
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.resource_path, "/run/dump1090-fa");
        assert_eq!(config.port, 9105);
        assert_eq!(config.origin(), Some(Position::new(-34.9, 138.6)));
        assert_eq!(config.sector_policy(), SectorPolicy::Reset);
        config.validate().unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "dump1090-exporter",
            "--resource-path",
            "http://192.168.1.10:8080/data",
            "--port",
            "9999",
            "--latitude",
            "-34.9",
            "--longitude",
            "138.6",
            "--stats-interval",
            "30",
        ]);
        let config = cli.apply(AppConfig::default());
        assert_eq!(config.resource_path, "http://192.168.1.10:8080/data");
        assert_eq!(config.port, 9999);
        assert_eq!(config.stats_interval, 30);
        assert_eq!(config.aircraft_interval, 10);
        assert_eq!(config.origin(), Some(Position::new(-34.9, 138.6)));
    }

    #[test]
    fn test_reset_sectors_flags() {
        let from_file = AppConfig {
            reset_sectors: true,
            ..AppConfig::default()
        };

        let cli = Cli::parse_from(["dump1090-exporter", "--no-reset-sectors"]);
        assert!(!cli.apply(from_file.clone()).reset_sectors);

        let cli = Cli::parse_from(["dump1090-exporter"]);
        assert!(cli.apply(from_file).reset_sectors);

        let cli = Cli::parse_from(["dump1090-exporter", "--reset-sectors"]);
        assert!(cli.apply(AppConfig::default()).reset_sectors);

        // The last of the two flags wins.
        let cli = Cli::parse_from(["dump1090-exporter", "--reset-sectors", "--no-reset-sectors"]);
        assert!(!cli.apply(AppConfig::default()).reset_sectors);
    }

    #[test]
    fn test_missing_config_file_is_created_with_defaults() {
        let dir = scratch_dir("missing");
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let check = |f: fn(&mut AppConfig)| {
            let mut config = AppConfig::default();
            f(&mut config);
            config.validate()
        };

        assert!(matches!(
            check(|c| c.resource_path = String::new()),
            Err(ConfigError::Resource(_))
        ));
        assert!(matches!(
            check(|c| {
                c.latitude = Some(91.0);
                c.longitude = Some(0.0);
            }),
            Err(ConfigError::Latitude(_))
        ));
        assert!(matches!(
            check(|c| {
                c.latitude = Some(0.0);
                c.longitude = Some(-180.5);
            }),
            Err(ConfigError::Longitude(_))
        ));
        assert!(matches!(
            check(|c| c.latitude = Some(-34.9)),
            Err(ConfigError::PartialOrigin)
        ));
        assert!(matches!(
            check(|c| c.stats_interval = 0),
            Err(ConfigError::ZeroInterval("stats_interval"))
        ));
        assert!(matches!(
            check(|c| c.fetch_timeout = 0.0),
            Err(ConfigError::FetchTimeout(_))
        ));
        assert!(matches!(
            check(|c| c.fetch_timeout = -1.0),
            Err(ConfigError::FetchTimeout(_))
        ));
        assert!(matches!(
            check(|c| c.aircraft_threshold = 0.0),
            Err(ConfigError::Threshold(_))
        ));
    }
}
