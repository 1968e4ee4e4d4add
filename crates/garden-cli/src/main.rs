//! Command-line interface for remote garden devices.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `devices` | List devices with their temperature and moisture |
//! | `show` | Show sensors and controls of one device |
//! | `toggle` | Flip a control and wait for the backend |
//! | `rename` | Rename a device |
//! | `garden` | Print the raw garden summary |
//! | `members` | List, add, remove, block and unblock members |
//! | `config` | Manage CLI configuration |
//! | `alias` | Manage device aliases |
//!
//! # Configuration
//!
//! Settings live in `~/.config/garden/config.toml` (or platform equivalent):
//! `base_url`, `token`, `token_file`, `device`, `cooldown_ms` and `aliases`.
//! `GARDEN_URL`, `GARDEN_TOKEN` and `GARDEN_DEVICE` override the file, and
//! flags override both.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;
mod util;

use cli::{Cli, Commands};
use commands::{
    cmd_alias, cmd_config, cmd_devices, cmd_garden, cmd_members, cmd_rename, cmd_show, cmd_toggle,
};
use config::Config;
use format::FormatOptions;
use util::{build_client, require_device};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config_file.clone().unwrap_or_else(Config::path);
    let config = Config::load_from(&config_path);
    let opts = FormatOptions::new(cli.no_color, cli.json).with_compact(cli.compact);

    let client = || build_client(cli.url.as_deref(), cli.token.clone(), &config);

    match cli.command {
        Commands::Devices => cmd_devices(&client()?, &opts).await,
        Commands::Show { device } => {
            let device_id = require_device(device.device, &config)?;
            cmd_show(Arc::new(client()?), &device_id, &opts).await
        }
        Commands::Toggle { device, control } => {
            let device_id = require_device(device.device, &config)?;
            cmd_toggle(
                Arc::new(client()?),
                &device_id,
                control,
                config.sync_options(),
                &opts,
            )
            .await
        }
        Commands::Rename { device, name } => {
            let device_id = require_device(device.device, &config)?;
            cmd_rename(&client()?, &device_id, &name, cli.quiet).await
        }
        Commands::Garden { device } => {
            let device_id = require_device(device.device, &config)?;
            cmd_garden(&client()?, &device_id, &opts).await
        }
        Commands::Members { device, action } => {
            let device_id = require_device(device.device, &config)?;
            cmd_members(&client()?, &device_id, action, cli.quiet, &opts).await
        }
        Commands::Config { action } => cmd_config(action, &config_path, &opts),
        Commands::Alias { action } => cmd_alias(action, &config_path, cli.quiet),
    }
}
