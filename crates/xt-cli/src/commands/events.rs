//! Events command for presenting stored tide events.
//!
//! Reads through the retrying accessor, so a contended database prints
//! nothing rather than failing.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use xt_core::TideRow;
use xt_db::Database;
use xt_service::{RetryPolicy, fetch_rows};

use crate::Config;

/// Prints up to `max` stored events, as text or JSON lines.
pub fn run<W: Write>(writer: &mut W, config: &Config, max: Option<usize>, json: bool) -> Result<()> {
    let db = Database::open_read_only(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let rows = fetch_rows(&db, max, RetryPolicy::default(), &Local);
    write_rows(writer, &rows, json)
}

fn write_rows<W: Write>(writer: &mut W, rows: &[TideRow], json: bool) -> Result<()> {
    if json {
        for row in rows {
            let line = serde_json::to_string(row)?;
            writeln!(writer, "{line}")?;
        }
        return Ok(());
    }

    let Some(first) = rows.first() else {
        writeln!(writer, "No tidal events stored.")?;
        return Ok(());
    };
    writeln!(writer, "{}", first.location)?;
    for row in rows {
        writeln!(
            writer,
            "{}  {:<9}  {}",
            row.time.format("%a %Y-%m-%d %l:%M %p %:z"),
            row.kind,
            row.level_display
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::FixedOffset;
    use insta::assert_snapshot;
    use xt_core::{Event, EventKind, UnitSystem};

    fn rows() -> Vec<TideRow> {
        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        [
            (1_720_339_920, EventKind::HighTide, 8.5),
            (1_720_369_860, EventKind::LowTide, -0.64),
        ]
        .into_iter()
        .map(|(timestamp, kind, level)| Event {
            timestamp,
            unit_system: UnitSystem::Imperial,
            location: "Palo Alto Yacht Harbor, San Francisco Bay, California".to_string(),
            kind,
            level,
        })
        .filter_map(|event| TideRow::from_event(&event, &tz))
        .collect()
    }

    #[test]
    fn text_rows() {
        let mut output = Vec::new();
        write_rows(&mut output, &rows(), false).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
Palo Alto Yacht Harbor, San Francisco Bay, California
Sun 2024-07-07  1:12 AM -07:00  High Tide  8.50 feet
Sun 2024-07-07  9:31 AM -07:00  Low Tide   -0.64 feet
");
    }

    #[test]
    fn json_rows() {
        let mut output = Vec::new();
        write_rows(&mut output, &rows()[..1], true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["kind"], "High Tide");
        assert_eq!(value["unit_system"], "imperial");
        assert_eq!(value["level_display"], "8.50 feet");
        assert_eq!(value["time"], "2024-07-07T01:12:00-07:00");
    }

    #[test]
    fn empty_store() {
        let mut output = Vec::new();
        write_rows(&mut output, &[], false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"No tidal events stored.");
    }
}
