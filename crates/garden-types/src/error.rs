//! Error types for parsing garden data in garden-types.

use thiserror::Error;

/// Errors that can occur when parsing garden device data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The control name is not one of `water`, `light` or `wind`.
    #[error("Unknown control: '{0}' (expected water, light or wind)")]
    UnknownControl(String),

    /// The mode label is not one of `manual`, `auto` or `unset`.
    #[error("Unknown control mode: '{0}'")]
    UnknownMode(String),

    /// The sensor type is not recognised.
    #[error("Unknown sensor type: '{0}'")]
    UnknownSensor(String),
}

/// Result type alias using garden-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
