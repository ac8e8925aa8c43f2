//! Fetch command for running the tide program once without storing anything.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};
use xt_core::Event;
use xt_service::TideProgram;

use crate::commands::util::format_timestamp;
use crate::{Config, TideArgs};

/// Runs the tide program and prints each parsed event.
pub async fn run<W: Write>(writer: &mut W, config: &Config, args: &TideArgs) -> Result<usize> {
    let tide = config
        .tide_config(args.location.as_deref(), args.prog.as_deref(), args.days)
        .context("invalid tide configuration")?;
    if !tide.prog.is_file() {
        bail!("{} does not exist!", tide.prog.display());
    }

    let parsed = TideProgram::new(tide)
        .fetch()
        .await
        .context("call to tide failed")?;
    for event in &parsed.events {
        write_event(writer, event, &Local)?;
    }
    Ok(parsed.events.len())
}

fn write_event<W: Write, Tz: TimeZone>(writer: &mut W, event: &Event, tz: &Tz) -> Result<()>
where
    Tz::Offset: Display,
{
    writeln!(
        writer,
        "dateTime: {}, type: {}, level: {:.6} {}",
        format_timestamp(event.timestamp, tz),
        event.kind,
        event.level,
        event.unit_system.abbreviation(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use xt_core::{EventKind, UnitSystem};

    #[test]
    fn event_line_layout() {
        let event = Event {
            timestamp: 1_720_339_920,
            unit_system: UnitSystem::Metric,
            location: "Palo Alto Yacht Harbor, San Francisco Bay, California".to_string(),
            kind: EventKind::HighTide,
            level: 2.3,
        };
        let mut output = Vec::new();
        write_event(&mut output, &event, &chrono::Utc).unwrap();

        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"dateTime: 2024-07-07 08:12:00 UTC (1720339920), type: High Tide, level: 2.300000 m"
        );
    }

    #[tokio::test]
    async fn missing_program_fails_before_running() {
        let config = Config {
            location: Some("Palo Alto Yacht Harbor".to_string()),
            prog: "/nonexistent/tide".into(),
            ..Config::default()
        };
        let args = crate::TideArgs {
            location: None,
            prog: None,
            days: None,
        };
        let mut output = Vec::new();
        let err = run(&mut output, &config, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "/nonexistent/tide does not exist!");
    }
}
