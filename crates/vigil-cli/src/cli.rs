//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};

/// Vigil CLI - Seed and inspect friendship state in a Vigil database.
#[derive(Debug, Parser)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// SQLite database file (overrides the config file)
    #[arg(short, long, global = true, env = "VIGIL_DATABASE")]
    pub database: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage user profiles
    User(UserArgs),

    /// Send, answer and list friend requests
    Request(RequestArgs),

    /// Manage existing friendships
    Friend(FriendArgs),

    /// Show how every other user relates to a user
    Classify(ClassifyArgs),

    /// Inspect configuration
    Config(ConfigArgs),
}

/// Arguments for user management.
#[derive(Debug, Parser)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

/// User management actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create a user profile
    Add {
        /// Display name
        name: String,
        /// Avatar URL
        #[arg(short, long)]
        image: Option<String>,
    },

    /// List all user profiles
    List,
}

/// Arguments for friend request commands.
#[derive(Debug, Parser)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub action: RequestAction,
}

/// Friend request actions.
///
/// Users may be given by id or by display name.
#[derive(Debug, Subcommand)]
pub enum RequestAction {
    /// Send a friend request
    Send {
        /// Requesting user
        from: String,
        /// Receiving user
        to: String,
    },

    /// Accept a pending request
    Accept {
        /// Request (edge) id
        edge: String,
        /// Recipient answering the request
        #[arg(short, long)]
        by: String,
    },

    /// Reject a pending request
    Reject {
        /// Request (edge) id
        edge: String,
        /// Recipient answering the request
        #[arg(short, long)]
        by: String,
    },

    /// List every request involving a user
    List {
        /// User whose requests to show
        user: String,
    },
}

/// Arguments for friendship commands.
#[derive(Debug, Parser)]
pub struct FriendArgs {
    #[command(subcommand)]
    pub action: FriendAction,
}

/// Friendship actions.
#[derive(Debug, Subcommand)]
pub enum FriendAction {
    /// End a friendship, acting as the first user
    Remove {
        /// Acting user
        a: String,
        /// Former friend
        b: String,
    },
}

/// Arguments for the classify command.
#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Viewpoint user
    pub user: String,

    /// Print refresh and lifecycle counters afterwards
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for configuration commands.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["vigil"]).is_err());
    }

    #[test]
    fn test_request_accept_command() {
        let cli = Cli::parse_from(["vigil", "request", "accept", "0190c0de-0000-7000-8000-000000000001", "--by", "bob"]);
        match cli.command {
            Command::Request(RequestArgs {
                action: RequestAction::Accept { edge, by },
            }) => {
                assert_eq!(edge, "0190c0de-0000-7000-8000-000000000001");
                assert_eq!(by, "bob");
            }
            other => panic!("Expected request accept, got {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vigil", "classify", "alice", "-f", "json", "-vv", "--no-color"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Classify(ClassifyArgs { ref user, metrics: false }) if user == "alice"));
    }

    #[test]
    fn test_user_add_with_image() {
        let cli = Cli::parse_from(["vigil", "user", "add", "Hannah", "--image", "https://img.example/h.png"]);
        match cli.command {
            Command::User(UserArgs {
                action: UserAction::Add { name, image },
            }) => {
                assert_eq!(name, "Hannah");
                assert_eq!(image.as_deref(), Some("https://img.example/h.png"));
            }
            other => panic!("Expected user add, got {other:?}"),
        }
    }

    #[test]
    fn test_format_conversion() {
        let format: OutputFormat = CliFormat::Quiet.into();
        assert_eq!(format, OutputFormat::Quiet);
    }
}
