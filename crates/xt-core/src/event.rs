//! Tidal events as reported by the tide program.

use std::fmt;

use serde::Serialize;

use crate::event_kind::EventKind;

/// Unit system a tide level is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Levels in feet.
    Imperial,
    /// Levels in meters.
    Metric,
}

impl UnitSystem {
    /// Infers the unit system from the unit token of a value column.
    ///
    /// `ft` is imperial; any other token is treated as metric.
    pub fn from_unit_token(token: &str) -> Self {
        if token == "ft" {
            Self::Imperial
        } else {
            Self::Metric
        }
    }

    /// Code stored in the `usUnits` column (1 = US, 16 = metric).
    pub const fn code(self) -> i64 {
        match self {
            Self::Imperial => 1,
            Self::Metric => 16,
        }
    }

    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Imperial),
            16 => Some(Self::Metric),
            _ => None,
        }
    }

    /// Short unit abbreviation, as printed by the tide program.
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Imperial => "ft",
            Self::Metric => "m",
        }
    }

    /// Unit label used when presenting a level.
    pub const fn level_label(self) -> &'static str {
        match self {
            Self::Imperial => "feet",
            Self::Metric => "meters",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imperial => write!(f, "imperial"),
            Self::Metric => write!(f, "metric"),
        }
    }
}

/// A single high or low tide.
///
/// Equality is exact on every field, including the level. This is what the
/// persistence merge relies on to decide whether a batch changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Unix timestamp (seconds) of the extremum.
    pub timestamp: i64,
    pub unit_system: UnitSystem,
    /// Human-readable location, e.g. `Palo Alto Yacht Harbor, San Francisco Bay, California`.
    pub location: String,
    pub kind: EventKind,
    /// Tide height in feet or meters depending on `unit_system`.
    pub level: f64,
}
