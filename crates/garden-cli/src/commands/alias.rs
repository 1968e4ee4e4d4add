//! Alias command implementation.
//!
//! Manages friendly device names (aliases) that map to device ids.

use std::path::Path;

use anyhow::{Result, bail};
use tabled::{builder::Builder, settings::Style};

use crate::cli::AliasSubcommand;
use crate::config::Config;

pub fn cmd_alias(action: AliasSubcommand, path: &Path, quiet: bool) -> Result<()> {
    let mut config = Config::load_from(path);

    match action {
        AliasSubcommand::List => {
            if config.aliases.is_empty() {
                if !quiet {
                    println!("No aliases configured.");
                    println!();
                    println!("Add an alias with: garden alias set <name> <device>");
                }
            } else {
                let mut builder = Builder::default();
                builder.push_record(["Alias", "Device"]);

                let mut aliases: Vec<_> = config.aliases.iter().collect();
                aliases.sort_by_key(|(name, _)| name.as_str());
                for (name, device) in aliases {
                    builder.push_record([name.as_str(), device.as_str()]);
                }

                let mut table = builder.build();
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
        AliasSubcommand::Set { name, device } => {
            if name.trim().is_empty() {
                bail!("Alias name cannot be empty");
            }
            if name == device {
                bail!("Alias '{}' would point to itself", name);
            }

            let was_update = config.aliases.contains_key(&name);
            config.aliases.insert(name.clone(), device.clone());
            config.save_to(path)?;

            if !quiet {
                if was_update {
                    println!("Updated alias '{}' → {}", name, device);
                } else {
                    println!("Added alias '{}' → {}", name, device);
                }
            }
        }
        AliasSubcommand::Remove { name } => {
            if config.aliases.remove(&name).is_some() {
                config.save_to(path)?;
                if !quiet {
                    println!("Removed alias '{}'", name);
                }
            } else {
                bail!("Alias '{}' not found", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_remove_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        cmd_alias(
            AliasSubcommand::Set {
                name: "backyard".into(),
                device: "esp-1".into(),
            },
            &path,
            true,
        )
        .unwrap();
        assert_eq!(
            Config::load_from(&path).aliases.get("backyard").map(String::as_str),
            Some("esp-1")
        );

        cmd_alias(AliasSubcommand::Remove { name: "backyard".into() }, &path, true).unwrap();
        assert!(Config::load_from(&path).aliases.is_empty());
    }

    #[test]
    fn test_remove_missing_alias_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let err = cmd_alias(AliasSubcommand::Remove { name: "nope".into() }, &path, true)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_self_referencing_alias_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let action = AliasSubcommand::Set {
            name: "esp-1".into(),
            device: "esp-1".into(),
        };
        assert!(cmd_alias(action, &path, true).is_err());
    }
}
