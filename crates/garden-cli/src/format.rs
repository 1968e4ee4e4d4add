//! Output formatting utilities for text and JSON output.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use garden_core::{ControlRow, ToggleOutcome};
use garden_types::{Device, Member, Sensor, SensorType};

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Emit JSON instead of text.
    pub json: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, json: bool) -> Self {
        Self {
            no_color,
            json,
            compact: false,
        }
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Sensor value with its unit, or `---` when unavailable.
#[must_use]
pub fn format_sensor(sensor: &Sensor) -> String {
    match sensor.value {
        Some(_) => format!("{} {}", sensor.display_value(), sensor.sensor_type.unit()),
        None => sensor.display_value(),
    }
}

fn sensor_label(sensor_type: SensorType) -> &'static str {
    match sensor_type {
        SensorType::Temperature => "Temperature",
        SensorType::Moisture => "Moisture",
        SensorType::Humidity => "Humidity",
        SensorType::Light => "Light",
    }
}

fn status_label(status: bool, no_color: bool) -> String {
    match (status, no_color) {
        (true, true) => "ON".to_string(),
        (false, true) => "OFF".to_string(),
        (true, false) => "ON".green().bold().to_string(),
        (false, false) => "OFF".dimmed().to_string(),
    }
}

/// Table of devices with their displayed sensors.
#[must_use]
pub fn format_devices_text(devices: &[Device], opts: &FormatOptions) -> String {
    if devices.is_empty() {
        return "No devices found.\n".to_string();
    }

    let mut builder = Builder::default();
    let mut header = vec!["Id", "Name"];
    header.extend(SensorType::DISPLAYED.iter().map(|&ty| sensor_label(ty)));
    header.push("Owner");
    builder.push_record(header);

    for device in devices {
        let mut record = vec![device.id.clone(), device.name.clone()];
        record.extend(device.displayed_sensors().iter().map(format_sensor));
        record.push(if device.is_owner { "yes" } else { "no" }.to_string());
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    let title = format!("{} device(s)", devices.len());
    if opts.no_color {
        format!("{}\n{}\n", title, table)
    } else {
        format!("{}\n{}\n", title.bold(), table)
    }
}

/// One line per control.
fn format_control_line(row: &ControlRow, opts: &FormatOptions) -> String {
    let name = format!("{:>6}", row.name.as_str());
    let name = if opts.no_color {
        name
    } else {
        name.dimmed().to_string()
    };

    if !row.available {
        return format!("  {}:  unavailable\n", name);
    }

    let mut line = format!(
        "  {}:  {:<3}  {}",
        name,
        status_label(row.status, opts.no_color),
        row.mode_label()
    );
    if row.cooling_down {
        line.push_str("  (cooling down)");
    }
    line.push('\n');
    line
}

/// Device card: header, displayed sensors and control rows.
#[must_use]
pub fn format_device_text(device: &Device, rows: &[ControlRow], opts: &FormatOptions) -> String {
    let mut output = String::new();

    let title = if device.name.is_empty() {
        device.id.as_str()
    } else {
        device.name.as_str()
    };
    if opts.no_color {
        output.push_str(&format!("  {}\n", title));
        output.push_str(&format!("  {}\n\n", "─".repeat(title.chars().count())));
    } else {
        output.push_str(&format!("  {}\n", title.cyan().bold()));
        output.push_str(&format!(
            "  {}\n\n",
            "─".repeat(title.chars().count()).dimmed()
        ));
    }

    let kv = |key: &str, value: &str| -> String {
        if opts.no_color {
            format!("  {:>11}:  {}\n", key, value)
        } else {
            format!("  {:>11}:  {}\n", key.dimmed(), value)
        }
    };

    output.push_str(&kv("Device", &device.id));
    if let Some(image) = device.image() {
        output.push_str(&kv("Image", image));
    }
    for sensor in device.displayed_sensors() {
        output.push_str(&kv(sensor_label(sensor.sensor_type), &format_sensor(&sensor)));
    }

    output.push_str("\n  Controls\n");
    for row in rows {
        output.push_str(&format_control_line(row, opts));
    }
    output
}

/// Table of members.
#[must_use]
pub fn format_members_text(members: &[Member], blocked: bool, _opts: &FormatOptions) -> String {
    if members.is_empty() {
        return if blocked {
            "No blocked users.\n".to_string()
        } else {
            "No members.\n".to_string()
        };
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Name", "Email", "Role"]);
    for member in members {
        builder.push_record([
            member.id.as_str(),
            member.name.as_deref().unwrap_or("-"),
            member.email.as_deref().unwrap_or("-"),
            member.role.as_deref().unwrap_or("-"),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    format!("{}\n", table)
}

/// Result line of a toggle.
#[must_use]
pub fn format_toggle_text(
    before: &ControlRow,
    after: &ControlRow,
    outcome: &ToggleOutcome,
    opts: &FormatOptions,
) -> String {
    let transition = format!(
        "{} → {}",
        status_label(before.status, opts.no_color),
        status_label(after.status, opts.no_color)
    );
    match outcome {
        ToggleOutcome::Confirmed(_) => {
            format!("{}: {} ({})\n", after.name, transition, after.mode_label())
        }
        ToggleOutcome::RolledBack { .. } => format!(
            "{}: unchanged, still {} ({})\n",
            after.name,
            status_label(after.status, opts.no_color),
            after.mode_label()
        ),
        ToggleOutcome::Stale { accepted } => format!(
            "{}: superseded (backend {})\n",
            after.name,
            if *accepted { "accepted" } else { "rejected" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::LocalControlState;
    use garden_types::{ControlMode, ControlName};

    fn plain() -> FormatOptions {
        FormatOptions::new(true, false)
    }

    fn row(status: bool, mode: ControlMode) -> ControlRow {
        ControlRow {
            name: ControlName::Water,
            available: true,
            status,
            mode,
            cooling_down: false,
        }
    }

    #[test]
    fn test_format_sensor_units() {
        assert_eq!(
            format_sensor(&Sensor::new(SensorType::Temperature, 21.04)),
            "21.0 °C"
        );
        assert_eq!(format_sensor(&Sensor::new(SensorType::Moisture, 55.0)), "55.0 %");
        assert_eq!(format_sensor(&Sensor::unavailable(SensorType::Moisture)), "---");
    }

    #[test]
    fn test_as_json_compact() {
        let opts = plain().with_compact(true);
        assert_eq!(opts.as_json(&vec![1, 2]).unwrap(), "[1,2]\n");
    }

    #[test]
    fn test_device_text_shows_placeholders() {
        let device = Device::new("esp-1", "Backyard");
        let rows = vec![
            row(true, ControlMode::Auto),
            ControlRow {
                name: ControlName::Wind,
                available: false,
                status: false,
                mode: ControlMode::Unset,
                cooling_down: false,
            },
        ];

        let text = format_device_text(&device, &rows, &plain());
        assert!(text.contains("Backyard"));
        assert!(text.contains("Temperature:  ---"));
        assert!(text.contains("Moisture:  ---"));
        assert!(text.contains("ON"));
        assert!(text.contains("auto"));
        assert!(text.contains("wind:  unavailable"));
    }

    #[test]
    fn test_devices_text_empty() {
        assert_eq!(format_devices_text(&[], &plain()), "No devices found.\n");
    }

    #[test]
    fn test_devices_text_table() {
        let mut device = Device::new("esp-1", "Backyard");
        device.sensors = vec![Sensor::new(SensorType::Moisture, 40.0)];
        let text = format_devices_text(&[device], &plain());
        assert!(text.contains("1 device(s)"));
        assert!(text.contains("esp-1"));
        assert!(text.contains("40.0 %"));
    }

    #[test]
    fn test_toggle_text() {
        let before = row(false, ControlMode::Auto);
        let after = row(true, ControlMode::Manual);
        let outcome = ToggleOutcome::Confirmed(LocalControlState::new(true, ControlMode::Manual));
        assert_eq!(
            format_toggle_text(&before, &after, &outcome, &plain()),
            "water: OFF → ON (manual)\n"
        );

        let rolled_back = ToggleOutcome::RolledBack {
            restored: LocalControlState::new(false, ControlMode::Auto),
            reason: "boom".into(),
        };
        assert_eq!(
            format_toggle_text(&before, &before, &rolled_back, &plain()),
            "water: unchanged, still OFF (auto)\n"
        );
    }

    #[test]
    fn test_members_text() {
        let members = vec![Member {
            id: "u1".into(),
            name: Some("Ana".into()),
            email: None,
            role: Some("owner".into()),
        }];
        let text = format_members_text(&members, false, &plain());
        assert!(text.contains("Ana"));
        assert!(text.contains("owner"));
        assert_eq!(format_members_text(&[], true, &plain()), "No blocked users.\n");
    }
}
