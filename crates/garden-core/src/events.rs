//! Control event system for toggle notifications.
//!
//! The synchronizer publishes a [`ControlEvent`] for every toggle phase. A
//! rejected toggle produces [`ControlEvent::ToggleFailed`], which is the
//! user-visible failure notification a front end should surface.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use garden_types::ControlName;

use crate::state::LocalControlState;

/// Message shown to the user when the backend rejects a toggle.
pub const TOGGLE_FAILED_MESSAGE: &str = "Failed to update control status.";

/// Events emitted by a control synchronizer.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ControlEvent {
    /// An optimistic state was applied and the update request sent.
    ToggleStarted {
        device_id: String,
        control: ControlName,
        state: LocalControlState,
    },
    /// The backend accepted the update.
    ToggleConfirmed {
        device_id: String,
        control: ControlName,
        state: LocalControlState,
    },
    /// The backend rejected the update.
    ToggleFailed {
        device_id: String,
        control: ControlName,
        /// User-facing message.
        message: String,
        /// Underlying error, for logs.
        reason: String,
        /// Whether the pre-toggle state was restored. `false` when fresh
        /// data replaced the entry while the request was in flight.
        rolled_back: bool,
    },
    /// The cooldown window ended and the control accepts toggles again.
    CooldownReleased {
        device_id: String,
        control: ControlName,
    },
}

impl ControlEvent {
    /// The control this event concerns.
    pub fn control(&self) -> ControlName {
        match self {
            Self::ToggleStarted { control, .. }
            | Self::ToggleConfirmed { control, .. }
            | Self::ToggleFailed { control, .. }
            | Self::CooldownReleased { control, .. } => *control,
        }
    }
}

/// Sender for control events.
pub type EventSender = broadcast::Sender<ControlEvent>;

/// Receiver for control events.
pub type EventReceiver = broadcast::Receiver<ControlEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: ControlEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_to_subscriber() {
        let dispatcher = EventDispatcher::default();
        let mut rx = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 1);

        dispatcher.send(ControlEvent::CooldownReleased {
            device_id: "esp-1".into(),
            control: ControlName::Wind,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.control(), ControlName::Wind);
    }

    #[test]
    fn test_send_without_receivers() {
        let dispatcher = EventDispatcher::new(4);
        dispatcher.send(ControlEvent::CooldownReleased {
            device_id: "esp-1".into(),
            control: ControlName::Water,
        });
    }

    #[test]
    fn test_event_serialization() {
        let event = ControlEvent::ToggleFailed {
            device_id: "esp-1".into(),
            control: ControlName::Light,
            message: TOGGLE_FAILED_MESSAGE.into(),
            reason: "Update rejected (500): boom".into(),
            rolled_back: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "toggle_failed");
        assert_eq!(json["control"], "light");
        assert_eq!(json["message"], TOGGLE_FAILED_MESSAGE);
        assert_eq!(json["rolled_back"], true);
    }
}
