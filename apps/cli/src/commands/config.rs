//! `kiln config` subcommands.

use crate::commands::types::ConfigCommand;
use crate::config::load_resolved;
use anyhow::{Context, Result};
use colored::Colorize;
use kiln_core::default_schema;

pub fn execute(command: ConfigCommand) -> Result<()> {
    let schema = default_schema().context("Failed to build configuration schema")?;

    match command {
        ConfigCommand::Show { source, json } => {
            let config = load_resolved(&schema, &source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config.to_json())?);
            } else {
                print!("{}", config.to_toml_string()?);
            }
        }
        ConfigCommand::Schema => {
            let fields = schema.describe();
            println!();
            println!("{}", format!("Configuration fields ({})", fields.len()).bold().cyan());
            println!();
            for field in fields {
                println!("  {field}");
            }
            println!();
        }
    }
    Ok(())
}
