//! Tide polling service for xtide.
//!
//! Provides:
//! - Running the tide program and parsing its predictions
//! - A staging area shared between the poller and the persistence merge
//! - The daily poller and the archive-period merge
//! - Retrying read access for presentation

pub mod config;
pub mod merge;
pub mod poller;
pub mod reader;
pub mod service;
pub mod staging;
pub mod tide;

pub use config::{ConfigError, ServiceConfig, TideConfig, UnitRequest};
pub use merge::{MergeOutcome, Merger};
pub use poller::Poller;
pub use reader::{RetryPolicy, fetch_events, fetch_rows};
pub use service::ServiceError;
pub use staging::Staging;
pub use tide::{TideError, TideProgram};
