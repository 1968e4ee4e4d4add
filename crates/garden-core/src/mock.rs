//! Mock gateway implementation for testing.
//!
//! This module provides an in-memory [`ControlGateway`] that records every
//! update request, so synchronizer behavior can be tested without a backend.
//!
//! # Features
//!
//! - **Failure injection**: Reject every request, or only the next N
//! - **Latency simulation**: Delay each response to observe optimistic state
//! - **Request log**: Inspect the exact updates that were sent

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use garden_types::ControlUpdate;

use crate::error::GatewayError;
use crate::gateway::ControlGateway;

/// One update request received by a [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub device_id: String,
    pub control_id: String,
    pub update: ControlUpdate,
}

/// A mock control gateway for testing.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use garden_core::{ControlGateway, MockGateway};
/// use garden_types::ControlUpdate;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gateway = MockGateway::builder()
///     .latency(Duration::from_millis(5))
///     .transient_failures(1)
///     .build();
///
/// let update = ControlUpdate::manual(true);
/// assert!(gateway.update_control("esp-1", "c1", &update).await.is_err());
/// assert!(gateway.update_control("esp-1", "c1", &update).await.is_ok());
/// assert_eq!(gateway.requests().await.len(), 2);
/// # }
/// ```
pub struct MockGateway {
    requests: RwLock<Vec<RecordedUpdate>>,
    request_count: AtomicU32,
    should_fail: AtomicBool,
    fail_status: AtomicU16,
    fail_message: RwLock<String>,
    /// Simulated response latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Number of requests to fail before succeeding.
    remaining_failures: AtomicU32,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("request_count", &self.request_count.load(Ordering::Relaxed))
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create a gateway that accepts every request immediately.
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(Vec::new()),
            request_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            fail_status: AtomicU16::new(500),
            fail_message: RwLock::new("Mock failure".to_string()),
            latency_ms: AtomicU64::new(0),
            remaining_failures: AtomicU32::new(0),
        }
    }

    /// Start building a mock gateway.
    pub fn builder() -> MockGatewayBuilder {
        MockGatewayBuilder::new()
    }

    /// Make every subsequent request fail (or succeed again).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }

    /// HTTP status reported by injected failures.
    pub fn set_fail_status(&self, status: u16) {
        self.fail_status.store(status, Ordering::Relaxed);
    }

    /// Set the simulated response latency.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Fail the next `count` requests, then behave normally.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedUpdate> {
        self.requests.read().await.clone()
    }

    async fn check_should_fail(&self) -> Result<(), GatewayError> {
        let status = self.fail_status.load(Ordering::Relaxed);

        let consumed = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(GatewayError::rejected(status, "Transient mock failure"));
        }

        if self.should_fail.load(Ordering::Relaxed) {
            let message = self.fail_message.read().await.clone();
            return Err(GatewayError::rejected(status, message));
        }

        Ok(())
    }
}

#[async_trait]
impl ControlGateway for MockGateway {
    async fn update_control(
        &self,
        device_id: &str,
        control_id: &str,
        update: &ControlUpdate,
    ) -> Result<(), GatewayError> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.requests.write().await.push(RecordedUpdate {
            device_id: device_id.to_string(),
            control_id: control_id.to_string(),
            update: *update,
        });

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        self.check_should_fail().await
    }
}

/// Builder for [`MockGateway`].
#[derive(Debug, Default)]
pub struct MockGatewayBuilder {
    should_fail: bool,
    fail_status: Option<u16>,
    fail_message: Option<String>,
    latency: Duration,
    transient_failures: u32,
}

impl MockGatewayBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every request with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.should_fail = true;
        self.fail_message = Some(message.to_string());
        self
    }

    /// HTTP status reported by injected failures (default 500).
    pub fn fail_status(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    /// Delay every response.
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the first `count` requests.
    pub fn transient_failures(mut self, count: u32) -> Self {
        self.transient_failures = count;
        self
    }

    /// Build the mock gateway.
    pub fn build(self) -> MockGateway {
        let mut gateway = MockGateway::new();
        gateway.should_fail.store(self.should_fail, Ordering::Relaxed);
        if let Some(status) = self.fail_status {
            gateway.set_fail_status(status);
        }
        if let Some(message) = self.fail_message {
            gateway.fail_message = RwLock::new(message);
        }
        gateway.set_latency(self.latency);
        gateway.set_transient_failures(self.transient_failures);
        gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_records_requests() {
        let gateway = MockGateway::new();
        let update = ControlUpdate::manual(true);

        gateway.update_control("esp-1", "c1", &update).await.unwrap();

        let requests = gateway.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].device_id, "esp-1");
        assert_eq!(requests[0].control_id, "c1");
        assert_eq!(requests[0].update, update);
    }

    #[tokio::test]
    async fn test_mock_gateway_fail() {
        let gateway = MockGateway::new();
        gateway.set_should_fail(true, Some("pump offline")).await;

        let err = gateway
            .update_control("esp-1", "c1", &ControlUpdate::manual(false))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pump offline"));
        assert_eq!(gateway.request_count(), 1);

        gateway.set_should_fail(false, None).await;
        assert!(
            gateway
                .update_control("esp-1", "c1", &ControlUpdate::manual(false))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_builder_failing_with_status() {
        let gateway = MockGateway::builder()
            .failing("forbidden")
            .fail_status(403)
            .build();

        let err = gateway
            .update_control("esp-1", "c1", &ControlUpdate::manual(true))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_simulation() {
        let gateway = MockGateway::builder()
            .latency(Duration::from_millis(300))
            .build();

        let start = tokio::time::Instant::now();
        gateway
            .update_control("esp-1", "c1", &ControlUpdate::manual(true))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_transient_failures_consumed_once_under_concurrency() {
        let gateway = std::sync::Arc::new(MockGateway::builder().transient_failures(1).build());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    gateway
                        .update_control("esp-1", &format!("c{}", i), &ControlUpdate::manual(true))
                        .await
                })
            })
            .collect();

        let mut failures = 0;
        for task in tasks {
            if task.await.unwrap().is_err() {
                failures += 1;
            }
        }
        assert_eq!(failures, 1);
        assert_eq!(gateway.remaining_failures.load(Ordering::Relaxed), 0);
    }
}
