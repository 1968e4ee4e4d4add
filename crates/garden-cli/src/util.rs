//! Shared helpers for command implementations.

use std::io::{self, Write};

use anyhow::{Context, Result, bail};

use garden_core::GardenClient;

use crate::config::{Config, resolve_base_url, resolve_device, token_provider};

/// Device id from the flag, env var or config, or an error explaining how to set one.
pub fn require_device(device: Option<String>, config: &Config) -> Result<String> {
    match resolve_device(device, config) {
        Some(id) => Ok(id),
        None => bail!(
            "No device specified. Use --device, set GARDEN_DEVICE, or run \
             'garden config init' and set `device` in the config file."
        ),
    }
}

/// Build the HTTP client from flags and config.
pub fn build_client(url: Option<&str>, token: Option<String>, config: &Config) -> Result<GardenClient> {
    let base_url = resolve_base_url(url, config);
    let client = GardenClient::new(&base_url)
        .with_context(|| format!("Invalid backend URL: {}", base_url))?;
    Ok(client.with_shared_tokens(token_provider(token, config)))
}

/// Print content to stdout.
pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_device_missing() {
        let err = require_device(None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("--device"));
    }

    #[test]
    fn test_require_device_from_config() {
        let config = Config {
            device: Some("esp-1".into()),
            ..Default::default()
        };
        assert_eq!(require_device(None, &config).unwrap(), "esp-1");
    }

    #[test]
    fn test_build_client_rejects_bad_url() {
        let err = build_client(Some("garden.local"), None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid backend URL"));
    }

    #[test]
    fn test_build_client_uses_config_url() {
        let config = Config {
            base_url: Some("http://localhost:3000/".into()),
            ..Default::default()
        };
        let client = build_client(None, None, &config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
