//! Display rows for stored tide events.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;

use crate::event::{Event, UnitSystem};
use crate::event_kind::EventKind;

/// A tide event prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TideRow {
    /// Event time in the display time zone.
    pub time: DateTime<FixedOffset>,
    pub unit_system: UnitSystem,
    pub location: String,
    /// Serialized as `High Tide` or `Low Tide`.
    pub kind: EventKind,
    pub level: f64,
    /// Level with two decimals and unit label, e.g. `8.50 feet`.
    pub level_display: String,
}

impl TideRow {
    /// Builds a row, localizing the timestamp in `tz`.
    ///
    /// Returns `None` if the timestamp is out of range for `chrono`.
    pub fn from_event<Tz: TimeZone>(event: &Event, tz: &Tz) -> Option<Self> {
        let time = tz.timestamp_opt(event.timestamp, 0).single()?.fixed_offset();
        Some(Self {
            time,
            unit_system: event.unit_system,
            location: event.location.clone(),
            kind: event.kind,
            level: event.level,
            level_display: format_level(event.level, event.unit_system),
        })
    }
}

/// Formats a level as `%0.2f <label>`.
pub fn format_level(level: f64, units: UnitSystem) -> String {
    format!("{level:.2} {}", units.level_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_formats_level_and_kind() {
        let event = Event {
            timestamp: 1_720_339_920,
            unit_system: UnitSystem::Imperial,
            location: "Palo Alto Yacht Harbor, San Francisco Bay, California".to_string(),
            kind: EventKind::HighTide,
            level: 8.5,
        };
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let row = TideRow::from_event(&event, &tz).unwrap();

        assert_eq!(row.kind, EventKind::HighTide);
        assert_eq!(row.level_display, "8.50 feet");
        assert_eq!(row.time.to_rfc3339(), "2024-07-07T01:12:00-07:00");
    }

    #[test]
    fn metric_label() {
        assert_eq!(format_level(-0.2, UnitSystem::Metric), "-0.20 meters");
    }
}
