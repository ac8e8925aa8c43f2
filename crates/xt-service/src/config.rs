//! Validated settings for talking to the tide program.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xt_core::LinePolicy;

/// Default location of the tide program.
pub const DEFAULT_PROG: &str = "/usr/bin/tide";

/// Default number of days of predictions to request.
pub const DEFAULT_DAYS: u32 = 14;

/// Default archive period, the cadence of the persistence merge.
pub const DEFAULT_ARCHIVE_INTERVAL: Duration = Duration::from_secs(300);

/// Configuration errors that prevent the service from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No location was configured.
    #[error("location must be specified")]
    MissingLocation,
    /// The day count was zero.
    #[error("days must be at least 1, got {0}")]
    InvalidDays(u32),
    /// The archive interval was zero.
    #[error("archive interval must be greater than zero")]
    InvalidArchiveInterval,
}

/// Units requested from the tide program with `-u`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitRequest {
    /// `-u ft`
    #[default]
    #[serde(rename = "ft")]
    Feet,
    /// `-u m`
    #[serde(rename = "m")]
    Meters,
    /// No `-u`; the station's native units.
    #[serde(rename = "native")]
    Native,
}

impl UnitRequest {
    /// Value for the `-u` flag, if one is passed.
    pub const fn flag_value(self) -> Option<&'static str> {
        match self {
            Self::Feet => Some("ft"),
            Self::Meters => Some("m"),
            Self::Native => None,
        }
    }
}

/// Everything needed to run and parse the tide program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TideConfig {
    pub location: String,
    pub prog: PathBuf,
    pub days: u32,
    pub units: UnitRequest,
    pub line_policy: LinePolicy,
}

impl TideConfig {
    /// Builds a config with defaults for everything but the location.
    pub fn new(location: Option<&str>) -> Result<Self, ConfigError> {
        let location = location
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .ok_or(ConfigError::MissingLocation)?;
        Ok(Self {
            location: location.to_string(),
            prog: PathBuf::from(DEFAULT_PROG),
            days: DEFAULT_DAYS,
            units: UnitRequest::default(),
            line_policy: LinePolicy::default(),
        })
    }

    #[must_use]
    pub fn with_prog(mut self, prog: impl Into<PathBuf>) -> Self {
        self.prog = prog.into();
        self
    }

    pub fn with_days(mut self, days: u32) -> Result<Self, ConfigError> {
        if days == 0 {
            return Err(ConfigError::InvalidDays(days));
        }
        self.days = days;
        Ok(self)
    }

    #[must_use]
    pub const fn with_units(mut self, units: UnitRequest) -> Self {
        self.units = units;
        self
    }

    #[must_use]
    pub const fn with_line_policy(mut self, line_policy: LinePolicy) -> Self {
        self.line_policy = line_policy;
        self
    }
}

/// Settings for the long-running service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub tide: TideConfig,
    pub database_path: PathBuf,
    pub archive_interval: Duration,
}

impl ServiceConfig {
    pub fn new(
        tide: TideConfig,
        database_path: impl Into<PathBuf>,
        archive_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if archive_interval.is_zero() {
            return Err(ConfigError::InvalidArchiveInterval);
        }
        Ok(Self {
            tide,
            database_path: database_path.into(),
            archive_interval,
        })
    }
}
