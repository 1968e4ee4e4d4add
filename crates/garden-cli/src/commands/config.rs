//! Config command implementation.

use std::path::Path;

use anyhow::{Result, bail};

use garden_core::DEFAULT_BASE_URL;

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::format::FormatOptions;
use crate::util::write_output;

pub fn cmd_config(action: ConfigAction, path: &Path, opts: &FormatOptions) -> Result<()> {
    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let mut config = Config::load_from(path);
            if config.token.is_some() {
                config.token = Some("<redacted>".to_string());
            }
            let content = if opts.json {
                opts.as_json(&config)?
            } else {
                toml::to_string_pretty(&config)?
            };
            write_output(&content)?;
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            let config = Config {
                base_url: Some(DEFAULT_BASE_URL.to_string()),
                ..Default::default()
            };
            config.save_to(path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
