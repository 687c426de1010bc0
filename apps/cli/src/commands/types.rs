//! Argument types shared by the kiln subcommands.

use clap::{Args, Subcommand};
use kiln_config::DEFAULT_CONFIG_DIR;
use kiln_training::DEFAULT_OUTPUT_DIR;
use std::path::PathBuf;

/// Configuration name looked up under `--config-path` when none is given.
pub const DEFAULT_CONFIG_NAME: &str = "text_classifier_training";

/// Where the configuration comes from.
#[derive(Args, Debug, Clone)]
pub struct ConfigSourceArgs {
    /// Directory holding configuration files
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    pub config_path: PathBuf,

    /// Configuration file name, without extension (.toml, .yaml or .yml)
    #[arg(long)]
    pub config_name: Option<String>,

    /// Overrides as `dotted.path=value`, applied after the file
    #[arg(value_name = "OVERRIDE")]
    pub overrides: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,

    /// Root directory for run outputs
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Print the run manifest as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the resolved configuration without constructing anything
    Show {
        #[command(flatten)]
        source: ConfigSourceArgs,

        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// List every configuration field with its type and default
    Schema,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RunsCommand {
    /// List finished runs
    List {
        /// Root directory for run outputs
        #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
