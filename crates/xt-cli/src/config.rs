//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use xt_core::LinePolicy;
use xt_service::config::{DEFAULT_ARCHIVE_INTERVAL, DEFAULT_DAYS, DEFAULT_PROG};
use xt_service::{ConfigError, ServiceConfig, TideConfig, UnitRequest};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Location to request predictions for, as known to the tide program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Path to the tide program.
    pub prog: PathBuf,

    /// Days of predictions to request.
    pub days: u32,

    /// Units requested from the tide program.
    pub units: UnitRequest,

    /// Path to the database file.
    pub database_path: PathBuf,

    /// Seconds between persistence merges.
    pub archive_interval_secs: u64,

    /// Skip malformed prediction lines instead of failing the whole poll.
    pub skip_malformed_lines: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("location", &self.location)
            .field("prog", &self.prog)
            .field("days", &self.days)
            .field("units", &self.units)
            .field("database_path", &self.database_path)
            .field("archive_interval_secs", &self.archive_interval_secs)
            .field("skip_malformed_lines", &self.skip_malformed_lines)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            location: None,
            prog: PathBuf::from(DEFAULT_PROG),
            days: DEFAULT_DAYS,
            units: UnitRequest::default(),
            database_path: data_dir.join("xtide.sdb"),
            archive_interval_secs: DEFAULT_ARCHIVE_INTERVAL.as_secs(),
            skip_malformed_lines: false,
        }
    }
}

impl Config {
    /// Loads configuration from the default locations and, optionally, a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (XTIDE_*)
        figment = figment.merge(Env::prefixed("XTIDE_"));

        figment.extract()
    }

    /// Settings for the tide program, with optional command-line overrides.
    pub fn tide_config(
        &self,
        location: Option<&str>,
        prog: Option<&Path>,
        days: Option<u32>,
    ) -> Result<TideConfig, ConfigError> {
        let line_policy = if self.skip_malformed_lines {
            LinePolicy::SkipMalformed
        } else {
            LinePolicy::FailFast
        };
        TideConfig::new(location.or(self.location.as_deref()))?
            .with_prog(prog.unwrap_or(&self.prog))
            .with_days(days.unwrap_or(self.days))
            .map(|config| config.with_units(self.units).with_line_policy(line_policy))
    }

    /// Settings for the long-running service.
    pub fn service_config(&self) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::new(
            self.tide_config(None, None, None)?,
            &self.database_path,
            Duration::from_secs(self.archive_interval_secs),
        )
    }
}

/// Returns the platform-specific config directory for xtide.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("xtide"))
}

/// Returns the platform-specific data directory for xtide.
///
/// On Linux: `~/.local/share/xtide`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("xtide"))
}
