//! Shared utilities for CLI commands.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::TimeZone;
use xt_core::Event;

/// Separator printed between records.
pub const RECORD_SEPARATOR: &str = "------------------------";

/// Formats a Unix timestamp as `YYYY-MM-DD HH:MM:SS ZONE (timestamp)`.
pub fn format_timestamp<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    tz.timestamp_opt(timestamp, 0).single().map_or_else(
        || timestamp.to_string(),
        |dt| format!("{} ({timestamp})", dt.format("%Y-%m-%d %H:%M:%S %Z")),
    )
}

/// Writes one event in the multi-line record layout.
pub fn write_record<W: Write, Tz: TimeZone>(writer: &mut W, event: &Event, tz: &Tz) -> io::Result<()>
where
    Tz::Offset: Display,
{
    writeln!(writer, "dateTime : {}", format_timestamp(event.timestamp, tz))?;
    writeln!(writer, "usUnits  : {}", event.unit_system.code())?;
    writeln!(writer, "location : {}", event.location)?;
    writeln!(writer, "eventType: {}", event.kind)?;
    writeln!(writer, "level    : {:.6}", event.level)?;
    writeln!(writer, "{RECORD_SEPARATOR}")
}
