//! Core types for garden devices.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Name of a remotely actuated control.
///
/// The set is closed: every device exposes at most one control per name, and
/// a client keeps local state for all three whether or not the device reports
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ControlName {
    /// Irrigation pump.
    Water,
    /// Grow light.
    Light,
    /// Ventilation fan.
    Wind,
}

impl ControlName {
    /// Every control name, in display order.
    pub const ALL: [ControlName; 3] = [ControlName::Water, ControlName::Light, ControlName::Wind];

    /// Wire name of the control.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlName::Water => "water",
            ControlName::Light => "light",
            ControlName::Wind => "wind",
        }
    }
}

impl fmt::Display for ControlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlName {
    type Err = ParseError;

    /// Parse a control name, ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use garden_types::ControlName;
    ///
    /// assert_eq!("Water".parse::<ControlName>(), Ok(ControlName::Water));
    /// assert!("fan".parse::<ControlName>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(ControlName::Water),
            "light" => Ok(ControlName::Light),
            "wind" => Ok(ControlName::Wind),
            _ => Err(ParseError::UnknownControl(s.to_string())),
        }
    }
}

/// Operational source of a control's current status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ControlMode {
    /// Status was set by a user.
    Manual,
    /// Status is driven by the device's own automation.
    Auto,
    /// The device has not reported a mode.
    #[default]
    Unset,
}

impl ControlMode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Manual => "manual",
            ControlMode::Auto => "auto",
            ControlMode::Unset => "unset",
        }
    }

    /// Short label shown next to a control switch.
    ///
    /// ```
    /// use garden_types::ControlMode;
    ///
    /// assert_eq!(ControlMode::Auto.label(), "auto");
    /// assert_eq!(ControlMode::Unset.label(), "---");
    /// ```
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ControlMode::Unset => "---",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(ControlMode::Manual),
            "auto" => Ok(ControlMode::Auto),
            "unset" | "---" | "" => Ok(ControlMode::Unset),
            _ => Err(ParseError::UnknownMode(s.to_string())),
        }
    }
}

/// Kind of measurement a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SensorType {
    /// Air temperature in °C.
    Temperature,
    /// Soil moisture in percent.
    Moisture,
    /// Relative humidity in percent.
    Humidity,
    /// Light intensity in lux.
    Light,
}

impl SensorType {
    /// Sensor types shown on a device card, in order.
    pub const DISPLAYED: [SensorType; 2] = [SensorType::Temperature, SensorType::Moisture];

    /// Wire name of the sensor type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Moisture => "moisture",
            SensorType::Humidity => "humidity",
            SensorType::Light => "light",
        }
    }

    /// Display unit for values of this sensor type.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Moisture | SensorType::Humidity => "%",
            SensorType::Light => "lx",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(SensorType::Temperature),
            "moisture" => Ok(SensorType::Moisture),
            "humidity" => Ok(SensorType::Humidity),
            "light" => Ok(SensorType::Light),
            _ => Err(ParseError::UnknownSensor(s.to_string())),
        }
    }
}

/// A read-only sensor measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensor {
    /// Kind of measurement.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub sensor_type: SensorType,
    /// Last reported value, `None` when unavailable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<f64>,
}

impl Sensor {
    /// Create a sensor with a known value.
    pub fn new(sensor_type: SensorType, value: f64) -> Self {
        Self {
            sensor_type,
            value: Some(value),
        }
    }

    /// Create a placeholder for a sensor the device did not report.
    pub fn unavailable(sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            value: None,
        }
    }

    /// Value formatted with one decimal, or `---` when unavailable.
    ///
    /// ```
    /// use garden_types::{Sensor, SensorType};
    ///
    /// assert_eq!(Sensor::new(SensorType::Moisture, 41.26).display_value(), "41.3");
    /// assert_eq!(Sensor::unavailable(SensorType::Moisture).display_value(), "---");
    /// ```
    #[must_use]
    pub fn display_value(&self) -> String {
        match self.value {
            Some(value) => format!("{:.1}", value),
            None => "---".to_string(),
        }
    }
}

/// A remotely actuated device function as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Control {
    /// Which actuator this is.
    pub name: ControlName,
    /// Backend identifier used to address update requests.
    #[cfg_attr(feature = "serde", serde(rename = "_id", alias = "id", default))]
    pub id: Option<String>,
    /// Current on/off status, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: Option<bool>,
    /// Current mode, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: Option<ControlMode>,
}

impl Control {
    /// Create a fully known control.
    pub fn new(name: ControlName, id: impl Into<String>, status: bool, mode: ControlMode) -> Self {
        Self {
            name,
            id: Some(id.into()),
            status: Some(status),
            mode: Some(mode),
        }
    }

    /// A control can be toggled only when both its remote identifier and
    /// status are known.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.id.is_some() && self.status.is_some()
    }
}

/// Deserialize a list, dropping entries that do not decode as `T`.
#[cfg(feature = "serde")]
fn skip_unknown_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry<T> {
        Known(T),
        Unknown(serde::de::IgnoredAny),
    }

    let entries = Vec::<Entry<T>>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Entry::Known(value) => Some(value),
            Entry::Unknown(_) => None,
        })
        .collect())
}

/// A garden device with its sensors and controls.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Device {
    /// Backend device identifier.
    #[cfg_attr(feature = "serde", serde(alias = "id_esp", alias = "_id"))]
    pub id: String,
    /// Display name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Image reference. Empty strings from the backend are kept as-is; use
    /// [`Device::image`] to read it.
    #[cfg_attr(feature = "serde", serde(rename = "img_area", default))]
    pub image: Option<String>,
    /// Sensors in backend order. Entries of unknown type are dropped.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "skip_unknown_entries")
    )]
    pub sensors: Vec<Sensor>,
    /// Controls in backend order. Entries with unknown names are dropped.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "skip_unknown_entries")
    )]
    pub controls: Vec<Control>,
    /// Whether the current user owns the device.
    #[cfg_attr(feature = "serde", serde(rename = "isOwner", default))]
    pub is_owner: bool,
}

impl Device {
    /// Create a device with no sensors or controls.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: None,
            sensors: Vec::new(),
            controls: Vec::new(),
            is_owner: false,
        }
    }

    /// Image reference, treating an empty string as absent.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }

    /// First control with the given name.
    #[must_use]
    pub fn control(&self, name: ControlName) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    /// First sensor of the given type.
    #[must_use]
    pub fn sensor(&self, sensor_type: SensorType) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.sensor_type == sensor_type)
    }

    /// Sensors shown on a device card: one per [`SensorType::DISPLAYED`]
    /// entry, substituting an unavailable placeholder when missing.
    #[must_use]
    pub fn displayed_sensors(&self) -> Vec<Sensor> {
        SensorType::DISPLAYED
            .iter()
            .map(|&ty| {
                self.sensor(ty)
                    .cloned()
                    .unwrap_or_else(|| Sensor::unavailable(ty))
            })
            .collect()
    }
}

/// A member with access to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Member {
    /// Backend user identifier.
    #[cfg_attr(feature = "serde", serde(alias = "_id", alias = "userId"))]
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub email: Option<String>,
    /// Role label as reported by the backend.
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: Option<String>,
}

/// Body of a control update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlUpdate {
    /// Requested on/off status.
    pub status: bool,
    /// Requested mode.
    pub mode: ControlMode,
}

impl ControlUpdate {
    /// A user-initiated update always switches the control to manual mode.
    pub fn manual(status: bool) -> Self {
        Self {
            status,
            mode: ControlMode::Manual,
        }
    }
}
