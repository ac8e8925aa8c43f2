//! Event kind enum as the single source of truth for tide event labels.

use serde::Serialize;
use std::fmt;

/// Classification of a line reported by the tide program.
///
/// Only [`EventKind::HighTide`] and [`EventKind::LowTide`] are ever stored;
/// everything else the program reports (sunrise, moonset, ...) is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    HighTide,
    LowTide,
    Other,
}

impl EventKind {
    /// Classifies a description column. Matching is exact and case-sensitive.
    pub fn classify(label: &str) -> Self {
        match label {
            "High Tide" => Self::HighTide,
            "Low Tide" => Self::LowTide,
            _ => Self::Other,
        }
    }

    /// Whether events of this kind are kept.
    pub const fn is_tide(self) -> bool {
        matches!(self, Self::HighTide | Self::LowTide)
    }

    /// Integer code used in the `eventType` column.
    pub const fn code(self) -> i64 {
        match self {
            Self::HighTide => 1,
            Self::LowTide => 2,
            Self::Other => 3,
        }
    }

    /// Decodes a stored `eventType` value. `Other` is never stored, so only 1 and 2 decode.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::HighTide),
            2 => Some(Self::LowTide),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighTide => "High Tide",
            Self::LowTide => "Low Tide",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
