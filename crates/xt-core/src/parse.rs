//! Parsing of the tide program's comma-separated "plain" output.
//!
//! A prediction line looks like:
//!
//! ```text
//! Palo Alto Yacht Harbor| San Francisco Bay| California,2024-07-07,1:12 AM PDT,8.50 ft,High Tide
//! ```
//!
//! Only lines with exactly [`COMMA_COUNT`] commas are considered; headers,
//! blank lines and anything else are ignored. Sunrise, moon phases and other
//! non-tide lines pass the comma filter but are dropped after classification.

use chrono::{NaiveDateTime, TimeZone};
use thiserror::Error;

use crate::event::{Event, UnitSystem};
use crate::event_kind::EventKind;

/// Number of commas in a well-formed prediction line (five columns).
pub const COMMA_COUNT: usize = 4;

/// Marker the tide program prefixes fatal errors with on stderr.
pub const FATAL_ERROR_PREFIX: &str = "XTide Fatal Error:";

/// Format of the joined date and time columns, e.g. `2024-07-07 8:32 PM PDT`.
///
/// The zone abbreviation is consumed but not interpreted; the wall-clock
/// time is localized in the caller's time zone.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M %p %Z";

/// Separator the tide program uses between location components.
const LOCATION_SEPARATOR: char = '|';

/// Errors converting a single accepted line into an [`Event`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The line did not have five columns.
    #[error("expected {} columns, found {found}", COMMA_COUNT + 1)]
    FieldCount { found: usize },

    /// The date and time columns did not match `YYYY-MM-DD h:mm AM/PM ZZZ`.
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The local time does not exist in the configured time zone.
    #[error("local time {value:?} does not exist in this time zone")]
    NonexistentLocalTime { value: String },

    /// The value column had no unit token.
    #[error("missing unit in level {value:?}")]
    MissingUnit { value: String },

    /// The value column's magnitude was not a number.
    #[error("invalid level {value:?}")]
    InvalidLevel { value: String },
}

/// An accepted line that failed to parse.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("malformed line {line:?}: {source}")]
pub struct LineError {
    pub line: String,
    #[source]
    pub source: ParseError,
}

/// What to do with an accepted line that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinePolicy {
    /// Abort the whole batch on the first malformed line.
    #[default]
    FailFast,
    /// Skip malformed lines and keep parsing.
    SkipMalformed,
}

/// Result of parsing one run of the tide program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// Lines that passed the comma filter.
    pub accepted_lines: usize,
    /// Lines that passed the comma filter but were skipped as malformed.
    pub malformed_lines: usize,
    /// High and low tides, ordered by timestamp.
    pub events: Vec<Event>,
}

/// Whether a line has the shape of a prediction line.
pub fn is_candidate(line: &str) -> bool {
    line.matches(',').count() == COMMA_COUNT
}

/// Parses the complete standard output of one tide program run.
///
/// Ignored lines are reported through `on_ignored` so the caller can log them.
pub fn parse_output<Tz: TimeZone>(
    stdout: &str,
    tz: &Tz,
    policy: LinePolicy,
    mut on_ignored: impl FnMut(&str),
) -> Result<ParsedOutput, LineError> {
    let mut parsed = ParsedOutput::default();
    for line in stdout.lines() {
        if !is_candidate(line) {
            on_ignored(line);
            continue;
        }
        parsed.accepted_lines += 1;
        match parse_line(line, tz) {
            Ok(Some(event)) => parsed.events.push(event),
            Ok(None) => {}
            Err(source) => {
                let error = LineError {
                    line: line.to_string(),
                    source,
                };
                match policy {
                    LinePolicy::FailFast => return Err(error),
                    LinePolicy::SkipMalformed => {
                        on_ignored(line);
                        parsed.malformed_lines += 1;
                    }
                }
            }
        }
    }
    parsed.events.sort_by_key(|event| event.timestamp);
    Ok(parsed)
}

/// Parses a single candidate line.
///
/// Returns `Ok(None)` for lines that are not high or low tides.
pub fn parse_line<Tz: TimeZone>(line: &str, tz: &Tz) -> Result<Option<Event>, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let cols: Vec<&str> = line.split(',').collect();
    let [location, date, time, value, description] = cols.as_slice() else {
        return Err(ParseError::FieldCount { found: cols.len() });
    };

    let kind = EventKind::classify(description);
    if !kind.is_tide() {
        return Ok(None);
    }

    let timestamp = parse_timestamp(date, time, tz)?;
    let (level, unit_system) = parse_level(value)?;

    Ok(Some(Event {
        timestamp,
        unit_system,
        location: location.replace(LOCATION_SEPARATOR, ","),
        kind,
        level,
    }))
}

/// Returns the first fatal error line reported on stderr, if any.
pub fn find_fatal_error(stderr: &str) -> Option<&str> {
    stderr
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .find(|line| line.starts_with(FATAL_ERROR_PREFIX))
}

fn parse_timestamp<Tz: TimeZone>(date: &str, time: &str, tz: &Tz) -> Result<i64, ParseError> {
    let value = format!("{date} {time}");
    let naive = NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(|source| {
        ParseError::Timestamp {
            value: value.clone(),
            source,
        }
    })?;
    // Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant.
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or(ParseError::NonexistentLocalTime { value })
}

fn parse_level(value: &str) -> Result<(f64, UnitSystem), ParseError> {
    let mut parts = value.split_whitespace();
    let magnitude = parts.next().ok_or_else(|| ParseError::InvalidLevel {
        value: value.to_string(),
    })?;
    let unit = parts.next().ok_or_else(|| ParseError::MissingUnit {
        value: value.to_string(),
    })?;
    let level = magnitude
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidLevel {
            value: value.to_string(),
        })?;
    Ok((level, UnitSystem::from_unit_token(unit)))
}
