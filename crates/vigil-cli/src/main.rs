//! Vigil CLI - Command-line interface for Vigil friendship data.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vigil_cli::commands::{self, Service};
use vigil_cli::{Cli, Command, Config, Formatter};
use vigil_friendship::FriendshipService;
use vigil_store::SqliteStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let no_color = cli.no_color;
    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(vigil_cli::config::OutputFormat::Table, !no_color);
        eprintln!("{}", formatter.error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v` flags.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::path()?,
    };
    let config = Config::load_or_init(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    let database = cli.database.map(PathBuf::from).unwrap_or_else(|| config.database.clone());

    match cli.command {
        Command::Config(args) => {
            commands::execute_config(args, &config, &config_path, &formatter).await?;
        }
        Command::User(args) => {
            let service = open_service(&database, &config)?;
            commands::execute_user(args, &service, &formatter).await?;
        }
        Command::Request(args) => {
            let service = open_service(&database, &config)?;
            commands::execute_request(args, &service, &formatter).await?;
        }
        Command::Friend(args) => {
            let service = open_service(&database, &config)?;
            commands::execute_friend(args, &service, &formatter).await?;
        }
        Command::Classify(args) => {
            let service = open_service(&database, &config)?;
            commands::execute_classify(args, &service, &formatter).await?;
        }
    }

    Ok(())
}

fn open_service(database: &Path, config: &Config) -> anyhow::Result<Service> {
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let store = SqliteStore::new(database).with_context(|| format!("Failed to open {}", database.display()))?;
    tracing::debug!(database = %database.display(), "Store opened");

    Ok(FriendshipService::new(Arc::new(store), config.friendship.clone()))
}
