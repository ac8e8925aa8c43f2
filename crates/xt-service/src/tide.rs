//! Running the tide program and collecting its predictions.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tokio::process::Command;
use xt_core::parse::{self, find_fatal_error};
use xt_core::{LineError, ParsedOutput, PredictionWindow};

use crate::config::TideConfig;

/// Step between predictions, passed as `-s`.
const STEP: &str = "01:00";

/// Failures of a single tide program run.
#[derive(Debug, Error)]
pub enum TideError {
    /// The program does not exist at the configured path.
    #[error("{} not found", prog.display())]
    ProgramNotFound { prog: PathBuf },
    /// The program exists but could not be started.
    #[error("failed to run {}: {source}", prog.display())]
    Spawn {
        prog: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The program reported a fatal error on stderr.
    #[error("{message}")]
    Fatal { message: String },
    /// The program produced no prediction lines.
    #[error("tide for location {location:?} returned no predictions ({status})")]
    NoOutput {
        location: String,
        status: ExitStatus,
    },
    /// An accepted line could not be converted into an event.
    #[error(transparent)]
    Parse(#[from] LineError),
}

/// Handle for invoking the configured tide program.
#[derive(Clone)]
pub struct TideProgram {
    config: TideConfig,
}

impl fmt::Debug for TideProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TideProgram")
            .field("prog", &self.config.prog)
            .field("location", &self.config.location)
            .field("days", &self.config.days)
            .finish_non_exhaustive()
    }
}

impl TideProgram {
    pub const fn new(config: TideConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &TideConfig {
        &self.config
    }

    /// Command-line arguments for a run covering `window`.
    pub fn args<Tz: TimeZone>(&self, window: &PredictionWindow<Tz>) -> Vec<String>
    where
        Tz::Offset: fmt::Display,
    {
        let mut args = vec![
            "-l".to_string(),
            self.config.location.clone(),
            "-b".to_string(),
            window.begin_arg(),
            "-e".to_string(),
            window.end_arg(),
        ];
        if let Some(units) = self.config.units.flag_value() {
            args.extend(["-u".to_string(), units.to_string()]);
        }
        args.extend(
            ["-f", "c", "-m", "p", "-s", STEP]
                .into_iter()
                .map(String::from),
        );
        args
    }

    /// Fetches predictions from the start of the current local day.
    pub async fn fetch(&self) -> Result<ParsedOutput, TideError> {
        self.fetch_at(&Local::now()).await
    }

    /// Fetches predictions for the day containing `now`, localizing times in `now`'s zone.
    pub async fn fetch_at<Tz>(&self, now: &DateTime<Tz>) -> Result<ParsedOutput, TideError>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: fmt::Display + Send + Sync,
    {
        let window = PredictionWindow::starting_today(now, self.config.days);
        let args = self.args(&window);
        tracing::debug!(prog = %self.config.prog.display(), ?args, "running tide");

        let output = Command::new(&self.config.prog)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    TideError::ProgramNotFound {
                        prog: self.config.prog.clone(),
                    }
                } else {
                    TideError::Spawn {
                        prog: self.config.prog.clone(),
                        source,
                    }
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let parsed = parse::parse_output(&stdout, &now.timezone(), self.config.line_policy, |line| {
            tracing::debug!(line, "ignoring line");
        })?;

        if parsed.accepted_lines == 0 {
            if let Some(message) = find_fatal_error(&stderr) {
                return Err(TideError::Fatal {
                    message: message.to_string(),
                });
            }
            return Err(TideError::NoOutput {
                location: self.config.location.clone(),
                status: output.status,
            });
        }

        if !output.status.success() {
            tracing::warn!(
                location = %self.config.location,
                status = %output.status,
                "tide exited unsuccessfully but returned predictions"
            );
        }
        if parsed.malformed_lines > 0 {
            tracing::warn!(count = parsed.malformed_lines, "skipped malformed tide lines");
        }
        tracing::info!(
            lines = parsed.accepted_lines,
            events = parsed.events.len(),
            "tide returned predictions"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    use crate::config::UnitRequest;

    fn window() -> PredictionWindow<FixedOffset> {
        let now = FixedOffset::west_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 7, 7, 9, 0, 0)
            .unwrap();
        PredictionWindow::starting_today(&now, 8)
    }

    #[test]
    fn args_request_plain_csv_in_feet() {
        let config = TideConfig::new(Some("Palo Alto Yacht Harbor")).unwrap();
        let args = TideProgram::new(config).args(&window());
        assert_eq!(
            args,
            [
                "-l",
                "Palo Alto Yacht Harbor",
                "-b",
                "2024-07-07 00:00",
                "-e",
                "2024-07-15 00:00",
                "-u",
                "ft",
                "-f",
                "c",
                "-m",
                "p",
                "-s",
                "01:00",
            ]
        );
    }

    #[test]
    fn native_units_omit_flag() {
        let config = TideConfig::new(Some("Palo Alto Yacht Harbor"))
            .unwrap()
            .with_units(UnitRequest::Native);
        let args = TideProgram::new(config).args(&window());
        assert!(!args.iter().any(|arg| arg == "-u"));
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let config = TideConfig::new(Some("Palo Alto Yacht Harbor"))
            .unwrap()
            .with_prog("/nonexistent/xtide/tide");
        let err = TideProgram::new(config).fetch().await.unwrap_err();
        assert!(matches!(err, TideError::ProgramNotFound { .. }));
        assert_eq!(err.to_string(), "/nonexistent/xtide/tide not found");
    }
}
