//! Error types for garden-core.
//!
//! Failures of the remote gateway never escape a toggle: the synchronizer
//! catches them, rolls the control back and emits a notification event. The
//! types here are what the gateway, credential and binder layers report.
//!
//! | Error | Raised by | Effect on a toggle |
//! |-------|-----------|--------------------|
//! | [`GatewayError`] | [`crate::ControlGateway`] implementations | rollback + [`crate::ControlEvent::ToggleFailed`] |
//! | [`CredentialError`] | [`crate::TokenProvider`] implementations | surfaces as [`GatewayError::Credentials`] |
//! | [`BinderError`] | [`crate::ControlBinder`] | toggle never starts |

use std::path::PathBuf;

use thiserror::Error;

use garden_types::ControlName;

/// Errors reported by a remote control gateway.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The backend could not be reached.
    #[error("Gateway not reachable: {0}")]
    Unreachable(String),

    /// The backend answered with a non-success status.
    #[error("Update rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or the status reason.
        message: String,
    },

    /// No credential could be resolved for the request.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// Any other transport failure.
    #[error("Gateway error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Create a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors resolving the bearer credential for an outbound request.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// The token file could not be read.
    #[error("Failed to read token file {path}: {message}")]
    Unreadable {
        /// Path of the token file.
        path: PathBuf,
        /// Underlying I/O error message.
        message: String,
    },

    /// A token was required but none is available.
    #[error("No credential available")]
    Missing,
}

/// Errors raised by the presentation binder before a toggle starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BinderError {
    /// The control is missing its remote identifier or status.
    #[error("Control '{0}' is not available on this device")]
    ControlUnavailable(ControlName),

    /// Fresh data belongs to a different device than the one bound.
    #[error("Device mismatch: bound to '{expected}', got '{actual}'")]
    DeviceMismatch {
        /// Identifier of the bound device.
        expected: String,
        /// Identifier of the device in the refresh.
        actual: String,
    },
}
