//! Show command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use garden_core::{ControlBinder, ControlRow, GardenClient, SyncOptions};
use garden_types::Device;

use crate::format::{FormatOptions, format_device_text};
use crate::util::write_output;

#[derive(Serialize)]
struct DeviceDetail<'a> {
    #[serde(flatten)]
    device: &'a Device,
    displayed_sensors: Vec<garden_types::Sensor>,
    control_rows: Vec<ControlRow>,
}

pub async fn cmd_show(client: Arc<GardenClient>, device_id: &str, opts: &FormatOptions) -> Result<()> {
    let device = client
        .device(device_id)
        .await
        .with_context(|| format!("Failed to fetch device {}", device_id))?;

    let binder = ControlBinder::new(device, client, SyncOptions::default());
    let rows = binder.rows();

    let content = if opts.json {
        opts.as_json(&DeviceDetail {
            device: binder.device(),
            displayed_sensors: binder.device().displayed_sensors(),
            control_rows: rows,
        })?
    } else {
        format_device_text(binder.device(), &rows, opts)
    };

    write_output(&content)
}
