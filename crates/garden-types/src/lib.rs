//! Platform-agnostic types for remote garden devices.
//!
//! This crate provides the data model shared by the garden client crates:
//! devices, their read-only sensors, and the remotely actuated controls
//! (water, light, wind) that a user can switch on and off.
//!
//! # Example
//!
//! ```
//! use garden_types::{Control, ControlMode, ControlName, Device};
//!
//! let mut device = Device::new("esp-1", "Backyard");
//! device
//!     .controls
//!     .push(Control::new(ControlName::Water, "c1", false, ControlMode::Auto));
//!
//! assert!(device.control(ControlName::Water).unwrap().is_available());
//! assert!(device.control(ControlName::Wind).is_none());
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    Control, ControlMode, ControlName, ControlUpdate, Device, Member, Sensor, SensorType,
};

/// Property-based tests for label parsing.
///
/// Labels come from user input (CLI arguments) and from the backend, so
/// parsing must never panic and must be stable under case changes.
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_control_name_never_panics(s in ".*") {
            let _ = s.parse::<ControlName>();
            let _ = s.parse::<ControlMode>();
            let _ = s.parse::<SensorType>();
        }

        #[test]
        fn control_name_parse_ignores_case(idx in 0usize..3, upper in any::<bool>()) {
            let name = ControlName::ALL[idx];
            let label = if upper {
                name.as_str().to_ascii_uppercase()
            } else {
                name.as_str().to_string()
            };
            prop_assert_eq!(label.parse::<ControlName>(), Ok(name));
        }
    }
}
