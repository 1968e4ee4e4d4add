//! Local control state and its toggle state machine.
//!
//! Each control name owns a [`ControlEntry`] that moves through
//! `Confirmed → Pending(snapshot) → {Confirmed | RolledBack}`. The snapshot
//! taken when a toggle starts lives only inside the `Pending` phase.
//!
//! Every transition that starts a toggle or replaces the entry with server
//! data bumps a generation counter. A remote result is applied only when its
//! generation still matches the pending one, so late answers for a replaced
//! entry are ignored.

use serde::{Deserialize, Serialize};

use garden_types::{Control, ControlMode, ControlUpdate};

/// Displayed state of one control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalControlState {
    /// On/off status.
    pub status: bool,
    /// Mode label.
    pub mode: ControlMode,
}

impl LocalControlState {
    /// Create a state.
    pub fn new(status: bool, mode: ControlMode) -> Self {
        Self { status, mode }
    }

    /// State derived from server data; absent fields become `false` / unset.
    pub fn from_control(control: Option<&Control>) -> Self {
        Self {
            status: control.and_then(|c| c.status).unwrap_or(false),
            mode: control.and_then(|c| c.mode).unwrap_or_default(),
        }
    }

    /// The state a user toggle moves to: status flipped, mode forced manual.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            status: !self.status,
            mode: ControlMode::Manual,
        }
    }
}

impl From<LocalControlState> for ControlUpdate {
    fn from(state: LocalControlState) -> Self {
        ControlUpdate {
            status: state.status,
            mode: state.mode,
        }
    }
}

/// Where a control is in the toggle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    /// The displayed state is the last server-confirmed value.
    Confirmed,
    /// An optimistic state is displayed while the remote call is in flight.
    Pending {
        /// State before the toggle, restored on rejection.
        snapshot: LocalControlState,
        /// Generation of the toggle that owns this phase.
        generation: u64,
    },
    /// The last toggle was rejected and the snapshot restored.
    RolledBack,
}

/// State machine for one control name.
#[derive(Debug, Clone)]
pub struct ControlEntry {
    current: LocalControlState,
    phase: ControlPhase,
    generation: u64,
}

impl Default for ControlEntry {
    fn default() -> Self {
        Self::new(LocalControlState::default())
    }
}

impl ControlEntry {
    /// Create a confirmed entry.
    pub fn new(state: LocalControlState) -> Self {
        Self {
            current: state,
            phase: ControlPhase::Confirmed,
            generation: 0,
        }
    }

    /// Currently displayed state.
    pub fn state(&self) -> LocalControlState {
        self.current
    }

    /// Current phase.
    pub fn phase(&self) -> ControlPhase {
        self.phase
    }

    /// Whether a toggle is awaiting its remote result.
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, ControlPhase::Pending { .. })
    }

    /// Replace the state with server data, abandoning any pending toggle.
    pub(crate) fn reset(&mut self, state: LocalControlState) {
        self.generation += 1;
        self.current = state;
        self.phase = ControlPhase::Confirmed;
    }

    /// Apply the optimistic state and enter `Pending`.
    ///
    /// Returns the optimistic state and the generation the remote result
    /// must present to settle it.
    pub(crate) fn begin_toggle(&mut self) -> (LocalControlState, u64) {
        self.generation += 1;
        let snapshot = self.current;
        self.current = snapshot.toggled();
        self.phase = ControlPhase::Pending {
            snapshot,
            generation: self.generation,
        };
        (self.current, self.generation)
    }

    /// Settle a successful toggle. Returns `false` if `generation` no longer
    /// owns the entry.
    pub(crate) fn confirm(&mut self, generation: u64) -> bool {
        match self.phase {
            ControlPhase::Pending { generation: g, .. } if g == generation => {
                self.phase = ControlPhase::Confirmed;
                true
            }
            _ => false,
        }
    }

    /// Restore the snapshot of a rejected toggle. Returns the restored state,
    /// or `None` if `generation` no longer owns the entry.
    pub(crate) fn roll_back(&mut self, generation: u64) -> Option<LocalControlState> {
        match self.phase {
            ControlPhase::Pending {
                snapshot,
                generation: g,
            } if g == generation => {
                self.current = snapshot;
                self.phase = ControlPhase::RolledBack;
                Some(snapshot)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_types::ControlName;

    #[test]
    fn test_from_control_defaults() {
        assert_eq!(
            LocalControlState::from_control(None),
            LocalControlState::new(false, ControlMode::Unset)
        );

        let partial = Control {
            name: ControlName::Light,
            id: None,
            status: Some(true),
            mode: None,
        };
        assert_eq!(
            LocalControlState::from_control(Some(&partial)),
            LocalControlState::new(true, ControlMode::Unset)
        );
    }

    #[test]
    fn test_toggled_forces_manual() {
        let auto = LocalControlState::new(false, ControlMode::Auto);
        assert_eq!(auto.toggled(), LocalControlState::new(true, ControlMode::Manual));
    }

    #[test]
    fn test_toggle_then_confirm() {
        let mut entry = ControlEntry::new(LocalControlState::new(false, ControlMode::Auto));
        let (optimistic, generation) = entry.begin_toggle();

        assert_eq!(optimistic, LocalControlState::new(true, ControlMode::Manual));
        assert!(entry.is_pending());
        assert!(entry.confirm(generation));
        assert_eq!(entry.phase(), ControlPhase::Confirmed);
        assert_eq!(entry.state(), optimistic);
    }

    #[test]
    fn test_toggle_then_roll_back() {
        let before = LocalControlState::new(false, ControlMode::Auto);
        let mut entry = ControlEntry::new(before);
        let (_, generation) = entry.begin_toggle();

        assert_eq!(entry.roll_back(generation), Some(before));
        assert_eq!(entry.state(), before);
        assert_eq!(entry.phase(), ControlPhase::RolledBack);
    }

    #[test]
    fn test_reset_discards_pending_result() {
        let mut entry = ControlEntry::default();
        let (_, generation) = entry.begin_toggle();

        let server = LocalControlState::new(true, ControlMode::Auto);
        entry.reset(server);

        assert_eq!(entry.roll_back(generation), None);
        assert!(!entry.confirm(generation));
        assert_eq!(entry.state(), server);
    }

    #[test]
    fn test_newer_toggle_owns_entry() {
        let mut entry = ControlEntry::default();
        let (_, first) = entry.begin_toggle();
        let (second_state, second) = entry.begin_toggle();

        assert_eq!(entry.roll_back(first), None);
        assert_eq!(entry.state(), second_state);
        assert!(entry.confirm(second));
    }
}
