//! Devices command implementation.

use anyhow::{Context, Result};

use garden_core::GardenClient;

use crate::format::{FormatOptions, format_devices_text};
use crate::util::write_output;

pub async fn cmd_devices(client: &GardenClient, opts: &FormatOptions) -> Result<()> {
    let devices = client
        .devices()
        .await
        .context("Failed to fetch devices")?;

    let content = if opts.json {
        opts.as_json(&devices)?
    } else {
        format_devices_text(&devices, opts)
    };

    write_output(&content)
}

/// Raw garden summary; always printed as JSON.
pub async fn cmd_garden(client: &GardenClient, device_id: &str, opts: &FormatOptions) -> Result<()> {
    let garden = client
        .garden(device_id)
        .await
        .with_context(|| format!("Failed to fetch garden for {}", device_id))?;

    write_output(&opts.as_json(&garden)?)
}
