//! Local-midnight anchored scheduling and prediction windows.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Offset, TimeDelta, TimeZone};

/// Format the tide program expects for `-b` and `-e`.
pub const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Returns how long to sleep from `now` until the next local midnight.
///
/// A non-positive interval (clock skew, DST edge) yields [`Duration::ZERO`]
/// so the caller proceeds immediately.
pub fn time_to_next_poll<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let tz = now.timezone();
    let next_midnight = now
        .date_naive()
        .succ_opt()
        .map_or_else(|| now.clone() + TimeDelta::days(1), |day| local_midnight(&tz, day, now));
    (next_midnight - now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Returns the start of the local day containing `now`.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    local_midnight(&now.timezone(), now.date_naive(), now)
}

/// The span of predictions requested from the tide program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionWindow<Tz: TimeZone> {
    pub begin: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> PredictionWindow<Tz> {
    /// From the start of today through `days` whole days later.
    pub fn starting_today(now: &DateTime<Tz>, days: u32) -> Self {
        let begin = start_of_day(now);
        let end = begin.clone() + TimeDelta::days(i64::from(days));
        Self { begin, end }
    }
}

impl<Tz: TimeZone> PredictionWindow<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    /// Value for the `-b` argument.
    pub fn begin_arg(&self) -> String {
        self.begin.format(WINDOW_FORMAT).to_string()
    }

    /// Value for the `-e` argument.
    pub fn end_arg(&self) -> String {
        self.end.format(WINDOW_FORMAT).to_string()
    }
}

/// Midnight at the start of `day`. Where DST skips midnight, falls back to
/// applying the offset in effect at `reference`.
fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate, reference: &DateTime<Tz>) -> DateTime<Tz> {
    let naive = day.and_time(chrono::NaiveTime::MIN);
    tz.from_local_datetime(&naive).earliest().unwrap_or_else(|| {
        let offset = reference.offset().fix();
        tz.from_utc_datetime(&(naive - offset))
    })
}
