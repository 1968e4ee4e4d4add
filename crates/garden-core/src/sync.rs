//! Optimistic control synchronization.
//!
//! A [`ControlSynchronizer`] owns the displayed state and the cooldown flag of
//! every control of one device. [`ControlSynchronizer::toggle`] applies the
//! flipped state at once, sends the update through a [`ControlGateway`], and
//! restores the pre-toggle snapshot if the backend rejects it.
//!
//! A toggle locks its control for a fixed cooldown (2 s by default) measured
//! from the moment the toggle starts, whatever the outcome of the remote call.
//! A backend slower than the cooldown keeps the control locked until its
//! answer arrives. Toggles while locked are ignored, so at most one update per
//! control is ever in flight.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use garden_core::{ControlSynchronizer, MockGateway, SyncOptions, Toggle};
//! use garden_types::{Control, ControlMode, ControlName};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sync = ControlSynchronizer::new("esp-1", Arc::new(MockGateway::new()), SyncOptions::default());
//! sync.initialize(&[Control::new(ControlName::Water, "c1", false, ControlMode::Auto)]);
//!
//! let toggle = sync.toggle(ControlName::Water, "c1");
//! // The optimistic state is visible before the backend answers.
//! assert!(sync.state(ControlName::Water).unwrap().status);
//! assert!(sync.is_cooling_down(ControlName::Water));
//!
//! // A second click inside the cooldown window is ignored.
//! assert!(matches!(sync.toggle(ControlName::Water, "c1"), Toggle::Debounced));
//!
//! toggle.outcome().await;
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use garden_types::{Control, ControlName, ControlUpdate};

use crate::events::{ControlEvent, EventDispatcher, EventReceiver, TOGGLE_FAILED_MESSAGE};
use crate::gateway::ControlGateway;
use crate::state::{ControlEntry, ControlPhase, LocalControlState};

/// Default cooldown after a toggle.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Options for a [`ControlSynchronizer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Minimum time a control stays locked after a toggle starts.
    pub cooldown: Duration,
    /// Capacity of the event channel.
    pub event_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            event_capacity: 100,
        }
    }
}

impl SyncOptions {
    /// Set the cooldown window.
    #[must_use]
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Final result of a toggle's remote confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The backend accepted the update; the optimistic state stands.
    Confirmed(LocalControlState),
    /// The backend rejected the update; the pre-toggle state was restored.
    RolledBack {
        restored: LocalControlState,
        reason: String,
    },
    /// The remote call settled after the entry was replaced by fresh data,
    /// or after the synchronizer was dropped. Nothing was applied.
    Stale {
        /// Whether the backend accepted the update.
        accepted: bool,
    },
}

impl ToggleOutcome {
    /// Whether the backend accepted the update.
    pub fn is_accepted(&self) -> bool {
        match self {
            ToggleOutcome::Confirmed(_) => true,
            ToggleOutcome::RolledBack { .. } => false,
            ToggleOutcome::Stale { accepted } => *accepted,
        }
    }
}

/// Handle to a toggle whose remote confirmation is running.
///
/// Dropping the handle does not cancel the toggle.
#[derive(Debug)]
pub struct ToggleHandle {
    control: ControlName,
    task: JoinHandle<ToggleOutcome>,
}

impl ToggleHandle {
    /// The control being toggled.
    pub fn control(&self) -> ControlName {
        self.control
    }

    /// Whether the remote call has settled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the remote call to settle.
    pub async fn outcome(self) -> ToggleOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Toggle task for {} did not complete: {}", self.control, e);
                ToggleOutcome::Stale { accepted: false }
            }
        }
    }
}

/// Result of calling [`ControlSynchronizer::toggle`].
#[derive(Debug)]
#[must_use = "a started toggle can be awaited for its outcome"]
pub enum Toggle {
    /// The control was cooling down; nothing happened.
    Debounced,
    /// The optimistic state was applied and the update sent.
    Started(ToggleHandle),
}

impl Toggle {
    /// Whether the call was ignored because of the cooldown.
    pub fn is_debounced(&self) -> bool {
        matches!(self, Toggle::Debounced)
    }

    /// Wait for the outcome, or `None` if the toggle was debounced.
    pub async fn outcome(self) -> Option<ToggleOutcome> {
        match self {
            Toggle::Debounced => None,
            Toggle::Started(handle) => Some(handle.outcome().await),
        }
    }
}

/// Read-only view of one control for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlView {
    pub name: ControlName,
    pub state: LocalControlState,
    pub phase: ControlPhase,
    pub cooling_down: bool,
}

#[derive(Debug, Default)]
struct Shared {
    controls: HashMap<ControlName, ControlEntry>,
    cooldowns: HashMap<ControlName, bool>,
}

impl Shared {
    fn is_cooling_down(&self, name: ControlName) -> bool {
        self.cooldowns.get(&name).copied().unwrap_or(false)
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // The guarded maps stay consistent even if a holder panicked.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns local control state and cooldowns for one device.
///
/// State lives as long as the synchronizer. Tasks spawned by a toggle only
/// hold a weak reference to it, so dropping the synchronizer discards the
/// state and any pending rollback or unlock becomes a no-op.
pub struct ControlSynchronizer {
    device_id: String,
    gateway: Arc<dyn ControlGateway>,
    options: SyncOptions,
    events: EventDispatcher,
    shared: Arc<Mutex<Shared>>,
}

impl std::fmt::Debug for ControlSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSynchronizer")
            .field("device_id", &self.device_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ControlSynchronizer {
    /// Create a synchronizer for `device_id` with no control data yet.
    pub fn new(
        device_id: impl Into<String>,
        gateway: Arc<dyn ControlGateway>,
        options: SyncOptions,
    ) -> Self {
        let events = EventDispatcher::new(options.event_capacity);
        Self {
            device_id: device_id.into(),
            gateway,
            options,
            events,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Identifier of the device this synchronizer serves.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Options in effect.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Subscribe to toggle events.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Load server-reported controls.
    ///
    /// Every name in [`ControlName::ALL`] gets the matching control's status
    /// and mode (`false` / unset when missing). Cooldown flags are added for
    /// new names only; a cooldown already running keeps running.
    pub fn initialize(&self, controls: &[Control]) {
        let mut shared = lock(&self.shared);
        for name in ControlName::ALL {
            let state =
                LocalControlState::from_control(controls.iter().find(|c| c.name == name));
            shared.controls.entry(name).or_default().reset(state);
            shared.cooldowns.entry(name).or_insert(false);
        }
        debug!(
            "Initialized {} controls for device {}",
            controls.len(),
            self.device_id
        );
    }

    /// Flip a control's status.
    ///
    /// If the control is cooling down this returns [`Toggle::Debounced`] and
    /// changes nothing. Otherwise the control is locked, the flipped state
    /// (mode forced to manual) is applied immediately, and the update is sent
    /// to the gateway in a spawned task. The lock is released
    /// [`SyncOptions::cooldown`] after this call, regardless of outcome, or
    /// when the remote call settles if that takes longer.
    ///
    /// Availability is not checked here; callers toggle only controls whose
    /// remote identifier and status are known.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn toggle(&self, name: ControlName, remote_id: impl Into<String>) -> Toggle {
        let started = Instant::now();

        let (optimistic, generation) = {
            let mut shared = lock(&self.shared);
            if shared.is_cooling_down(name) {
                debug!("Ignoring toggle of {} on {}: cooling down", name, self.device_id);
                return Toggle::Debounced;
            }
            shared.cooldowns.insert(name, true);
            shared.controls.entry(name).or_default().begin_toggle()
        };

        debug!(
            "Toggling {} on {} to {} ({})",
            name, self.device_id, optimistic.status, optimistic.mode
        );
        self.events.send(ControlEvent::ToggleStarted {
            device_id: self.device_id.clone(),
            control: name,
            state: optimistic,
        });

        let (settled_tx, settled_rx) = oneshot::channel();
        self.schedule_unlock(name, started + self.options.cooldown, settled_rx);

        let task = tokio::spawn(confirm(
            ConfirmContext {
                gateway: Arc::clone(&self.gateway),
                shared: Arc::downgrade(&self.shared),
                events: self.events.clone(),
                device_id: self.device_id.clone(),
                remote_id: remote_id.into(),
            },
            settled_tx,
            name,
            optimistic,
            generation,
        ));

        Toggle::Started(ToggleHandle {
            control: name,
            task,
        })
    }

    fn schedule_unlock(
        &self,
        name: ControlName,
        deadline: Instant,
        settled: oneshot::Receiver<()>,
    ) {
        let shared = Arc::downgrade(&self.shared);
        let events = self.events.clone();
        let device_id = self.device_id.clone();

        tokio::spawn(async move {
            sleep_until(deadline).await;
            // A dropped sender means the confirm task ended without settling.
            if settled.await.is_err() {
                debug!("Confirmation of {} ended early; releasing cooldown", name);
            }
            let Some(shared) = shared.upgrade() else {
                debug!("Cooldown for {} ended after synchronizer was dropped", name);
                return;
            };
            lock(&shared).cooldowns.insert(name, false);
            debug!("Cooldown released for {} on {}", name, device_id);
            events.send(ControlEvent::CooldownReleased {
                device_id,
                control: name,
            });
        });
    }

    /// Displayed state of a control, or `None` before any data was loaded.
    pub fn state(&self, name: ControlName) -> Option<LocalControlState> {
        lock(&self.shared).controls.get(&name).map(ControlEntry::state)
    }

    /// State machine phase of a control.
    pub fn phase(&self, name: ControlName) -> Option<ControlPhase> {
        lock(&self.shared).controls.get(&name).map(ControlEntry::phase)
    }

    /// Whether a control is inside its cooldown window.
    pub fn is_cooling_down(&self, name: ControlName) -> bool {
        lock(&self.shared).is_cooling_down(name)
    }

    /// Raw cooldown flag; `None` until the name has been seen.
    pub fn cooldown_flag(&self, name: ControlName) -> Option<bool> {
        lock(&self.shared).cooldowns.get(&name).copied()
    }

    /// Views of every known control, in [`ControlName::ALL`] order.
    pub fn views(&self) -> Vec<ControlView> {
        let shared = lock(&self.shared);
        ControlName::ALL
            .iter()
            .filter_map(|&name| {
                shared.controls.get(&name).map(|entry| ControlView {
                    name,
                    state: entry.state(),
                    phase: entry.phase(),
                    cooling_down: shared.is_cooling_down(name),
                })
            })
            .collect()
    }
}

struct ConfirmContext {
    gateway: Arc<dyn ControlGateway>,
    shared: Weak<Mutex<Shared>>,
    events: EventDispatcher,
    device_id: String,
    remote_id: String,
}

async fn confirm(
    ctx: ConfirmContext,
    settled: oneshot::Sender<()>,
    name: ControlName,
    optimistic: LocalControlState,
    generation: u64,
) -> ToggleOutcome {
    let outcome = settle(&ctx, name, optimistic, generation).await;
    // The unlock task is gone only when the runtime is shutting down.
    let _ = settled.send(());
    outcome
}

async fn settle(
    ctx: &ConfirmContext,
    name: ControlName,
    optimistic: LocalControlState,
    generation: u64,
) -> ToggleOutcome {
    let update = ControlUpdate::from(optimistic);
    let result = ctx
        .gateway
        .update_control(&ctx.device_id, &ctx.remote_id, &update)
        .await;

    let Some(shared) = ctx.shared.upgrade() else {
        debug!("Toggle of {} settled after synchronizer was dropped", name);
        return ToggleOutcome::Stale {
            accepted: result.is_ok(),
        };
    };

    match result {
        Ok(()) => {
            let applied = lock(&shared)
                .controls
                .get_mut(&name)
                .is_some_and(|entry| entry.confirm(generation));
            drop(shared);

            if !applied {
                debug!("Confirmation for {} superseded by newer data", name);
                return ToggleOutcome::Stale { accepted: true };
            }

            info!(
                "Confirmed {} on {}: status={}",
                name, ctx.device_id, optimistic.status
            );
            ctx.events.send(ControlEvent::ToggleConfirmed {
                device_id: ctx.device_id.clone(),
                control: name,
                state: optimistic,
            });
            ToggleOutcome::Confirmed(optimistic)
        }
        Err(e) => {
            let restored = lock(&shared)
                .controls
                .get_mut(&name)
                .and_then(|entry| entry.roll_back(generation));
            drop(shared);

            warn!("Failed to update {} on {}: {}", name, ctx.device_id, e);
            ctx.events.send(ControlEvent::ToggleFailed {
                device_id: ctx.device_id.clone(),
                control: name,
                message: TOGGLE_FAILED_MESSAGE.to_string(),
                reason: e.to_string(),
                rolled_back: restored.is_some(),
            });

            match restored {
                Some(restored) => ToggleOutcome::RolledBack {
                    restored,
                    reason: e.to_string(),
                },
                None => ToggleOutcome::Stale { accepted: false },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;
    use garden_types::ControlMode;

    fn water(status: bool, mode: ControlMode) -> Control {
        Control::new(ControlName::Water, "c1", status, mode)
    }

    fn synchronizer(gateway: &Arc<MockGateway>) -> ControlSynchronizer {
        ControlSynchronizer::new("esp-1", gateway.clone(), SyncOptions::default())
    }

    #[test]
    fn test_options_builder() {
        let options = SyncOptions::default()
            .cooldown(Duration::from_millis(500))
            .event_capacity(0);
        assert_eq!(options.cooldown, Duration::from_millis(500));
        assert_eq!(options.event_capacity, 1);
        assert_eq!(SyncOptions::default().cooldown, DEFAULT_COOLDOWN);
    }

    #[test]
    fn test_state_absent_before_initialize() {
        let gateway = Arc::new(MockGateway::new());
        let sync = synchronizer(&gateway);
        assert_eq!(sync.state(ControlName::Water), None);
        assert_eq!(sync.cooldown_flag(ControlName::Water), None);
        assert!(sync.views().is_empty());
    }

    #[test]
    fn test_initialize_fills_every_name() {
        let gateway = Arc::new(MockGateway::new());
        let sync = synchronizer(&gateway);
        sync.initialize(&[water(true, ControlMode::Auto)]);

        assert_eq!(
            sync.state(ControlName::Water),
            Some(LocalControlState::new(true, ControlMode::Auto))
        );
        for name in [ControlName::Light, ControlName::Wind] {
            assert_eq!(sync.state(name), Some(LocalControlState::default()));
            assert_eq!(sync.cooldown_flag(name), Some(false));
        }
        assert_eq!(sync.views().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_without_initialize_uses_defaults() {
        let gateway = Arc::new(MockGateway::new());
        let sync = synchronizer(&gateway);

        let outcome = sync.toggle(ControlName::Light, "c2").outcome().await;
        assert_eq!(
            outcome,
            Some(ToggleOutcome::Confirmed(LocalControlState::new(
                true,
                ControlMode::Manual
            )))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_emits_events() {
        let gateway = Arc::new(MockGateway::new());
        let sync = synchronizer(&gateway);
        sync.initialize(&[water(false, ControlMode::Auto)]);
        let mut rx = sync.subscribe();

        sync.toggle(ControlName::Water, "c1").outcome().await;

        assert!(matches!(rx.recv().await.unwrap(), ControlEvent::ToggleStarted { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ControlEvent::ToggleConfirmed { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ControlEvent::CooldownReleased { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_emits_notification() {
        let gateway = Arc::new(MockGateway::builder().failing("pump offline").build());
        let sync = synchronizer(&gateway);
        sync.initialize(&[water(false, ControlMode::Auto)]);
        let mut rx = sync.subscribe();

        let outcome = sync.toggle(ControlName::Water, "c1").outcome().await.unwrap();
        assert!(!outcome.is_accepted());

        let _started = rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            ControlEvent::ToggleFailed {
                message,
                reason,
                rolled_back,
                ..
            } => {
                assert_eq!(message, TOGGLE_FAILED_MESSAGE);
                assert!(reason.contains("pump offline"));
                assert!(rolled_back);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_initialize_during_pending_supersedes_result() {
        let gateway = Arc::new(
            MockGateway::builder()
                .failing("late")
                .latency(Duration::from_millis(500))
                .build(),
        );
        let sync = synchronizer(&gateway);
        sync.initialize(&[water(false, ControlMode::Auto)]);
        let mut rx = sync.subscribe();

        let toggle = sync.toggle(ControlName::Water, "c1");
        sync.initialize(&[water(true, ControlMode::Manual)]);

        assert_eq!(
            toggle.outcome().await,
            Some(ToggleOutcome::Stale { accepted: false })
        );
        assert_eq!(
            sync.state(ControlName::Water),
            Some(LocalControlState::new(true, ControlMode::Manual))
        );

        let _started = rx.recv().await.unwrap();
        match rx.recv().await.unwrap() {
            ControlEvent::ToggleFailed { rolled_back, .. } => assert!(!rolled_back),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_before_settle_is_harmless() {
        let gateway = Arc::new(
            MockGateway::builder()
                .failing("late")
                .latency(Duration::from_millis(500))
                .build(),
        );
        let sync = synchronizer(&gateway);
        sync.initialize(&[water(false, ControlMode::Auto)]);

        let toggle = sync.toggle(ControlName::Water, "c1");
        drop(sync);

        assert_eq!(
            toggle.outcome().await,
            Some(ToggleOutcome::Stale { accepted: false })
        );
        // Let the unlock timer fire against the discarded state.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(gateway.request_count(), 1);
    }
}
