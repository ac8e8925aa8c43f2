//! xtide CLI library.
//!
//! This crate provides the CLI interface and the configuration for xtide.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, TideArgs};
pub use config::Config;
