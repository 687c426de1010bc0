//! Command implementations for the kiln CLI.

pub mod config;
pub mod runs;
pub mod train;
pub mod types;

pub use types::{ConfigCommand, RunsCommand, TrainArgs};
