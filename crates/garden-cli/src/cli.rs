//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use garden_types::ControlName;

/// Reusable device selection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Device id or alias, or use GARDEN_DEVICE env var
    #[arg(short, long, env = "GARDEN_DEVICE")]
    pub device: Option<String>,
}

#[derive(Parser)]
#[command(name = "garden")]
#[command(author, version, about = "CLI for remote garden devices", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output (NO_COLOR accepts 1, true, yes or on)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_color: bool,

    /// Backend base URL, or use GARDEN_URL env var
    #[arg(long, global = true, env = "GARDEN_URL")]
    pub url: Option<String>,

    /// Bearer token, or use GARDEN_TOKEN env var
    #[arg(long, global = true, env = "GARDEN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "GARDEN_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List devices available to the current user
    Devices,

    /// Show sensors and controls of a device
    Show {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Flip a control (water, light or wind) and wait for the backend
    Toggle {
        #[command(flatten)]
        device: DeviceArgs,

        /// Control to toggle
        control: ControlName,
    },

    /// Rename a device
    Rename {
        #[command(flatten)]
        device: DeviceArgs,

        /// New display name
        name: String,
    },

    /// Print the raw garden summary of a device
    Garden {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Manage device members
    Members {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(subcommand)]
        action: MemberAction,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage device aliases (friendly names)
    Alias {
        #[command(subcommand)]
        action: AliasSubcommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum MemberAction {
    /// List members
    List {
        /// List blocked users instead
        #[arg(long)]
        blocked: bool,
    },
    /// Add members; the JSON body is sent unchanged
    Add {
        /// Request body, e.g. '{"email": "ana@example.com"}'
        body: String,
    },
    /// Remove a member
    Remove { member: String },
    /// Change a member's role
    Promote { member: String },
    /// Block a user
    Block { member: String },
    /// Lift a block
    Unblock { member: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AliasSubcommand {
    /// List all aliases
    List,
    /// Set an alias for a device id
    Set {
        /// Alias name (e.g., "backyard")
        name: String,
        /// Device id
        device: String,
    },
    /// Remove an alias
    #[command(alias = "rm")]
    Remove {
        /// Alias name to remove
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_toggle() {
        let cli = Cli::try_parse_from(["garden", "toggle", "-d", "esp-1", "Water"]).unwrap();
        match cli.command {
            Commands::Toggle { device, control } => {
                assert_eq!(device.device.as_deref(), Some("esp-1"));
                assert_eq!(control, ControlName::Water);
            }
            _ => panic!("expected toggle"),
        }
    }

    #[test]
    fn test_parse_toggle_rejects_unknown_control() {
        assert!(Cli::try_parse_from(["garden", "toggle", "sprinkler"]).is_err());
    }

    #[test]
    fn test_parse_members_blocked() {
        let cli = Cli::try_parse_from(["garden", "--json", "members", "list", "--blocked"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Members {
                action: MemberAction::List { blocked: true },
                ..
            }
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["garden", "devices", "--url", "http://localhost:3000", "-q"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://localhost:3000"));
        assert!(cli.quiet);
    }
}
