//! Kiln CLI - configuration-driven training runs
//!
//! Resolves a schema-validated configuration from defaults, a config file
//! and `key=value` overrides, then builds and runs the training pipeline.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{ConfigCommand, RunsCommand, TrainArgs};

/// Kiln - schema-validated training bootstrapper
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    author,
    version,
    about = "Kiln - schema-validated training bootstrapper",
    long_about = "Kiln resolves a hierarchical, type-checked configuration from schema defaults,\na configuration file and command-line overrides, then trains a model with it."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the configuration, construct the pipeline and train
    ///
    /// Builds the model, data loader, optimizer and trainer in that order and
    /// runs training once. Outputs go to `<output-dir>/<run-id>/`.
    Train(TrainArgs),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Inspect finished runs
    #[command(subcommand)]
    Runs(RunsCommand),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so `--json` output stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Train(train_args) => commands::train::execute(train_args)?,
        Command::Config(command) => commands::config::execute(command)?,
        Command::Runs(command) => commands::runs::execute(command)?,
    }

    Ok(())
}
