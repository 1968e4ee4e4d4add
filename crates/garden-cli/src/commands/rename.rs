//! Rename command implementation.

use anyhow::{Context, Result, bail};

use garden_core::GardenClient;

pub async fn cmd_rename(client: &GardenClient, device_id: &str, name: &str, quiet: bool) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Device name cannot be empty");
    }

    client
        .rename_device(device_id, name)
        .await
        .with_context(|| format!("Failed to rename device {}", device_id))?;

    if !quiet {
        println!("Renamed {} to '{}'", device_id, name);
    }
    Ok(())
}
