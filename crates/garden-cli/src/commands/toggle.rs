//! Toggle command implementation.
//!
//! Runs the full control flow once: fetch the device, bind its controls,
//! toggle, and wait for the backend to confirm or reject the update.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use garden_core::{
    ControlBinder, ControlRow, GardenClient, SyncOptions, TOGGLE_FAILED_MESSAGE, ToggleOutcome,
};
use garden_types::{ControlMode, ControlName};

use crate::format::{FormatOptions, format_toggle_text};
use crate::util::write_output;

/// JSON result of a toggle.
#[derive(Debug, Serialize)]
pub struct ToggleReport {
    pub device_id: String,
    pub control: ControlName,
    pub accepted: bool,
    pub status: bool,
    pub mode: ControlMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToggleReport {
    pub fn new(device_id: &str, row: &ControlRow, outcome: &ToggleOutcome) -> Self {
        let error = match outcome {
            ToggleOutcome::RolledBack { reason, .. } => Some(reason.clone()),
            _ => None,
        };
        Self {
            device_id: device_id.to_string(),
            control: row.name,
            accepted: outcome.is_accepted(),
            status: row.status,
            mode: row.mode,
            error,
        }
    }
}

pub async fn cmd_toggle(
    client: Arc<GardenClient>,
    device_id: &str,
    control: ControlName,
    options: SyncOptions,
    opts: &FormatOptions,
) -> Result<()> {
    let device = client
        .device(device_id)
        .await
        .with_context(|| format!("Failed to fetch device {}", device_id))?;

    let binder = ControlBinder::new(device, client, options);
    let mut events = binder.synchronizer().subscribe();
    let before = binder.row(control);

    let Some(outcome) = binder.toggle(control)?.outcome().await else {
        bail!("Control '{}' is cooling down, try again shortly", control);
    };

    while let Ok(event) = events.try_recv() {
        debug!("{:?}", event);
    }

    let after = binder.row(control);
    let content = if opts.json {
        opts.as_json(&ToggleReport::new(&binder.device().id, &after, &outcome))?
    } else {
        format_toggle_text(&before, &after, &outcome, opts)
    };
    write_output(&content)?;

    match outcome {
        ToggleOutcome::RolledBack { reason, .. } => {
            bail!("{} ({})", TOGGLE_FAILED_MESSAGE, reason)
        }
        ToggleOutcome::Stale { accepted: false } => bail!(TOGGLE_FAILED_MESSAGE),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::LocalControlState;

    #[test]
    fn test_report_for_rollback() {
        let row = ControlRow {
            name: ControlName::Light,
            available: true,
            status: false,
            mode: ControlMode::Auto,
            cooling_down: true,
        };
        let outcome = ToggleOutcome::RolledBack {
            restored: LocalControlState::new(false, ControlMode::Auto),
            reason: "API error (500): pump offline".into(),
        };

        let report = ToggleReport::new("esp-1", &row, &outcome);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["control"], "light");
        assert_eq!(json["accepted"], false);
        assert_eq!(json["mode"], "auto");
        assert_eq!(json["error"], "API error (500): pump offline");
    }

    #[test]
    fn test_report_for_confirmation_omits_error() {
        let row = ControlRow {
            name: ControlName::Water,
            available: true,
            status: true,
            mode: ControlMode::Manual,
            cooling_down: true,
        };
        let outcome = ToggleOutcome::Confirmed(LocalControlState::new(true, ControlMode::Manual));

        let json = serde_json::to_value(ToggleReport::new("esp-1", &row, &outcome)).unwrap();
        assert_eq!(json["accepted"], true);
        assert!(json.get("error").is_none());
    }
}
