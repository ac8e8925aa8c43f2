//! CLI subcommand implementations.

pub mod events;
pub mod fetch;
pub mod run;
pub mod test_service;
pub mod util;
pub mod view;
