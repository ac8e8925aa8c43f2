//! View command for dumping a database file.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use xt_core::Event;
use xt_db::Database;

use crate::commands::util::write_record;

/// Prints every event stored in the database at `path`.
pub fn run<W: Write>(writer: &mut W, path: &Path) -> Result<()> {
    let db = Database::open_read_only(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let events = db.list_events(None)?;
    write_records(writer, &events, &Local)?;
    Ok(())
}

fn write_records<W: Write, Tz: TimeZone>(writer: &mut W, events: &[Event], tz: &Tz) -> Result<()>
where
    Tz::Offset: Display,
{
    for event in events {
        write_record(writer, event, tz)?;
    }
    Ok(())
}
