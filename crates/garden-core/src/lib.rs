//! Core library for remote garden devices.
//!
//! This crate keeps the displayed state of a garden device's controls (water
//! pump, grow light, fan) in sync with the backend. Toggles are applied
//! optimistically and rolled back when the backend rejects them.
//!
//! # Features
//!
//! - **Optimistic toggles**: The new state is shown before the backend answers
//! - **Exact rollback**: A rejected toggle restores status and mode
//! - **Cooldown debounce**: One update per control every 2 seconds
//! - **Toggle events**: Subscribe to confirmations and failures
//! - **REST client**: Devices, members and control updates over HTTP
//! - **Pluggable credentials**: Bearer tokens resolved per request
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use garden_core::{ControlBinder, GardenClient, StaticToken, SyncOptions};
//! use garden_types::ControlName;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(
//!         GardenClient::new("https://garden.example.com")?.with_tokens(StaticToken::new("secret")),
//!     );
//!
//!     let device = client.device("esp-1").await?;
//!     let binder = ControlBinder::new(device, client.clone(), SyncOptions::default());
//!
//!     if let Some(outcome) = binder.toggle(ControlName::Water)?.outcome().await {
//!         println!("accepted: {}", outcome.is_accepted());
//!     }
//!     Ok(())
//! }
//! ```

pub mod binder;
#[cfg(feature = "http-client")]
pub mod client;
pub mod credentials;
pub mod error;
pub mod events;
pub mod gateway;
pub mod mock;
pub mod state;
pub mod sync;

pub use garden_types::types;

pub use binder::{ControlBinder, ControlRow};
#[cfg(feature = "http-client")]
pub use client::{ClientError, DEFAULT_BASE_URL, GardenClient};
pub use credentials::{NoToken, StaticToken, TokenFile, TokenProvider};
pub use error::{BinderError, CredentialError, GatewayError};
pub use events::{ControlEvent, EventDispatcher, EventReceiver, EventSender, TOGGLE_FAILED_MESSAGE};
pub use gateway::ControlGateway;
pub use mock::{MockGateway, MockGatewayBuilder, RecordedUpdate};
pub use state::{ControlEntry, ControlPhase, LocalControlState};
pub use sync::{
    ControlSynchronizer, ControlView, DEFAULT_COOLDOWN, SyncOptions, Toggle, ToggleHandle,
    ToggleOutcome,
};

pub use garden_types::{Control, ControlMode, ControlName, ControlUpdate, Device, Member, Sensor, SensorType};
