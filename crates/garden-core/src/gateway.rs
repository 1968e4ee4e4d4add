//! Remote control gateway abstraction.
//!
//! The [`ControlGateway`] trait is the seam between the synchronizer and the
//! transport. [`crate::client::GardenClient`] implements it over HTTP and
//! [`crate::mock::MockGateway`] implements it in memory for tests.

use std::sync::Arc;

use async_trait::async_trait;

use garden_types::ControlUpdate;

use crate::error::GatewayError;

/// Sends control updates to the backend.
///
/// # Example
///
/// ```
/// use garden_core::{ControlGateway, MockGateway};
/// use garden_types::ControlUpdate;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gateway = MockGateway::new();
/// gateway
///     .update_control("esp-1", "c1", &ControlUpdate::manual(true))
///     .await
///     .unwrap();
/// assert_eq!(gateway.request_count(), 1);
/// # }
/// ```
#[async_trait]
pub trait ControlGateway: Send + Sync {
    /// Request that control `control_id` on device `device_id` take the
    /// given status and mode.
    async fn update_control(
        &self,
        device_id: &str,
        control_id: &str,
        update: &ControlUpdate,
    ) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: ControlGateway + ?Sized> ControlGateway for Arc<G> {
    async fn update_control(
        &self,
        device_id: &str,
        control_id: &str,
        update: &ControlUpdate,
    ) -> Result<(), GatewayError> {
        (**self).update_control(device_id, control_id, update).await
    }
}
