//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub async fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => match formatter.format() {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            _ => {
                if formatter.format() == OutputFormat::Table {
                    println!("{}", formatter.info(&format!("Configuration from {}", path.display())));
                }
                println!("{}", config.to_toml()?);
            }
        },
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}
