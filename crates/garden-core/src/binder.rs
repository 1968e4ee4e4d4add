//! Binds a device's controls to a [`ControlSynchronizer`] for rendering.
//!
//! The binder holds the latest [`Device`] snapshot, feeds its controls into
//! the synchronizer when they change, and exposes one [`ControlRow`] per
//! control name with everything a switch needs: availability, displayed
//! state, mode label and whether it is dimmed by a cooldown.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use garden_types::{ControlMode, ControlName, Device};

use crate::error::BinderError;
use crate::gateway::ControlGateway;
use crate::sync::{ControlSynchronizer, SyncOptions, Toggle};

/// Render data for one control switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRow {
    pub name: ControlName,
    /// Remote identifier and status are both known.
    pub available: bool,
    pub status: bool,
    pub mode: ControlMode,
    pub cooling_down: bool,
}

impl ControlRow {
    /// The switch accepts input.
    pub fn is_interactive(&self) -> bool {
        self.available && !self.cooling_down
    }

    /// The switch is drawn dimmed.
    pub fn is_dimmed(&self) -> bool {
        self.cooling_down
    }

    /// Label shown next to the switch.
    pub fn mode_label(&self) -> &'static str {
        self.mode.label()
    }
}

/// Connects device data with the control synchronizer of that device.
#[derive(Debug)]
pub struct ControlBinder {
    device: Device,
    sync: ControlSynchronizer,
}

impl ControlBinder {
    /// Bind `device` and initialize its controls.
    pub fn new(device: Device, gateway: Arc<dyn ControlGateway>, options: SyncOptions) -> Self {
        let sync = ControlSynchronizer::new(device.id.clone(), gateway, options);
        sync.initialize(&device.controls);
        Self { device, sync }
    }

    /// Latest device snapshot.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The underlying synchronizer.
    pub fn synchronizer(&self) -> &ControlSynchronizer {
        &self.sync
    }

    /// Accept freshly fetched device data.
    ///
    /// The synchronizer is re-initialized only when the controls differ from
    /// the previous snapshot.
    pub fn refresh(&mut self, device: Device) -> Result<(), BinderError> {
        if device.id != self.device.id {
            return Err(BinderError::DeviceMismatch {
                expected: self.device.id.clone(),
                actual: device.id,
            });
        }

        if device.controls != self.device.controls {
            debug!("Controls of {} changed, re-initializing", device.id);
            self.sync.initialize(&device.controls);
        }
        self.device = device;
        Ok(())
    }

    /// One row per control name, in [`ControlName::ALL`] order.
    pub fn rows(&self) -> Vec<ControlRow> {
        ControlName::ALL
            .iter()
            .map(|&name| self.row(name))
            .collect()
    }

    /// Row for a single control.
    pub fn row(&self, name: ControlName) -> ControlRow {
        let state = self.sync.state(name).unwrap_or_default();
        ControlRow {
            name,
            available: self.device.control(name).is_some_and(|c| c.is_available()),
            status: state.status,
            mode: state.mode,
            cooling_down: self.sync.is_cooling_down(name),
        }
    }

    /// Toggle a control on user interaction.
    ///
    /// Controls without a remote identifier or status are rejected before
    /// the synchronizer sees them.
    pub fn toggle(&self, name: ControlName) -> Result<Toggle, BinderError> {
        let remote_id = self
            .device
            .control(name)
            .filter(|c| c.is_available())
            .and_then(|c| c.id.clone())
            .ok_or(BinderError::ControlUnavailable(name))?;

        Ok(self.sync.toggle(name, remote_id))
    }
}
