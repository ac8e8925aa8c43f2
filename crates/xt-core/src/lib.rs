//! Core domain logic for xtide.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: high and low tides and their classification
//! - Parsing: turning the tide program's plain output into events
//! - Scheduling: local-midnight polling and prediction windows
//! - Presentation: display rows for stored events

pub mod event;
pub mod event_kind;
pub mod parse;
pub mod present;
pub mod schedule;

pub use event::{Event, UnitSystem};
pub use event_kind::EventKind;
pub use parse::{LineError, LinePolicy, ParseError, ParsedOutput, parse_line, parse_output};
pub use present::TideRow;
pub use schedule::{PredictionWindow, time_to_next_poll};
