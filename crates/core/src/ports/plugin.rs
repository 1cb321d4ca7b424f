//! Plugin port — the boundary every device plugin implements.
//!
//! Plugin entry points are synchronous and return a status telling the core
//! whether the operation completed in place or continues in the background.
//! Background work reports back through the [`PluginHandle`] the plugin
//! receives at [`DevicePlugin::init`]; each completion carries the
//! correlation key the core handed out (device id, transaction id, action
//! id). Delivering a completion nobody waits for is a silent no-op.

use std::collections::HashSet;

use casahub_domain::action::Action;
use casahub_domain::device::Device;
use casahub_domain::device_class::{DeviceClass, DeviceDescriptor};
use casahub_domain::error::DeviceError;
use casahub_domain::event::Event;
use casahub_domain::id::{
    ActionId, DeviceClassId, DeviceId, PairingTransactionId, PluginId, StateTypeId,
};
use casahub_domain::param::Param;
use casahub_domain::vendor::Vendor;

use crate::hardware::HardwareResource;
use crate::reactor::CoreMessage;

/// Outcome of a setup or pairing-confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    /// Setup completed synchronously; the device is ready.
    Done,
    /// Setup continues in the background; completion arrives through the
    /// plugin handle.
    Async,
}

/// Outcome of an action execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteStatus {
    /// The action finished synchronously.
    Done,
    /// Execution continues in the background; completion arrives through
    /// the plugin handle keyed by the action id.
    Async,
}

/// A pluggable device family.
///
/// The core calls the lifecycle methods in order: [`init`](Self::init) once
/// at registration, then [`setup_device`](Self::setup_device) per configured
/// device, and the remaining entry points as the user and the rule engine
/// demand. Implementations must never block; long-running work belongs on a
/// spawned task that reports back via the handle.
pub trait DevicePlugin: Send {
    /// Stable unique identifier of this plugin.
    fn plugin_id(&self) -> PluginId;

    /// Human-readable plugin name.
    fn plugin_name(&self) -> &str;

    /// Vendors this plugin contributes to the registry.
    fn supported_vendors(&self) -> Vec<Vendor>;

    /// Device classes this plugin contributes to the registry.
    fn supported_device_classes(&self) -> Vec<DeviceClass>;

    /// Shared hardware resources this plugin needs. Empty means none.
    fn required_hardware(&self) -> HashSet<HardwareResource> {
        HashSet::new()
    }

    /// Called once when the plugin is registered with the core.
    fn init(&mut self, handle: PluginHandle) {
        let _ = handle;
    }

    /// Prepare a device for use (on creation, edit, and hub restart).
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] when the device cannot be set up; the core
    /// will not add the device to the store.
    fn setup_device(&mut self, device: &Device) -> Result<SetupStatus, DeviceError> {
        let _ = device;
        Ok(SetupStatus::Done)
    }

    /// Notification that a device of this plugin was removed.
    fn device_removed(&mut self, device: &Device) {
        let _ = device;
    }

    /// Start discovery of candidate devices for the given class.
    ///
    /// Results are always delivered asynchronously via
    /// [`PluginHandle::devices_discovered`], correlated by device class id.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::CreationMethodNotSupported`] by default.
    fn discover_devices(
        &mut self,
        device_class_id: DeviceClassId,
        params: &[Param],
    ) -> Result<(), DeviceError> {
        let _ = (device_class_id, params);
        Err(DeviceError::CreationMethodNotSupported)
    }

    /// Validate a pairing secret.
    ///
    /// On [`SetupStatus::Async`] the plugin finishes via
    /// [`PluginHandle::pairing_finished`] keyed by the transaction id. After
    /// a successful confirmation the core calls
    /// [`setup_device`](Self::setup_device) with the new device, so plugins
    /// meet every device through the same entry point.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::SetupFailed`] by default; classes using
    /// `JustAdd` setup never reach this entry point.
    fn confirm_pairing(
        &mut self,
        transaction_id: PairingTransactionId,
        device_class_id: DeviceClassId,
        secret: &str,
    ) -> Result<SetupStatus, DeviceError> {
        let _ = (transaction_id, device_class_id, secret);
        Err(DeviceError::SetupFailed)
    }

    /// Execute an action on one of this plugin's devices.
    ///
    /// # Errors
    ///
    /// Returns a [`DeviceError`] when execution cannot start; asynchronous
    /// failures arrive via [`PluginHandle::action_finished`] instead.
    fn execute_action(
        &mut self,
        device: &Device,
        action: &Action,
    ) -> Result<ExecuteStatus, DeviceError>;

    /// Periodic tick from the shared plugin timer, for plugins that declared
    /// [`HardwareResource::Timer`].
    fn timer_tick(&mut self) {}

    /// Raw radio timing samples, for plugins that declared a radio resource.
    /// Every declaring plugin sees every signal and decides for itself
    /// whether it belongs to one of its devices.
    fn radio_data(&mut self, samples: &[i32]) {
        let _ = samples;
    }
}

/// The plugin's channel back into the core.
///
/// Cloneable and cheap; plugins hand clones to their background tasks. All
/// methods enqueue a message for the reactor and never block. Sending after
/// the core has shut down is silently dropped.
#[derive(Debug, Clone)]
pub struct PluginHandle {
    sender: tokio::sync::mpsc::UnboundedSender<CoreMessage>,
}

impl PluginHandle {
    pub(crate) fn new(sender: tokio::sync::mpsc::UnboundedSender<CoreMessage>) -> Self {
        Self { sender }
    }

    /// Push an event into the core; the sole channel for plugin events.
    pub fn emit_event(&self, event: Event) {
        let _ = self.sender.send(CoreMessage::EventEmitted(event));
    }

    /// Request a state update on a device. The store applies the update and
    /// synthesizes the "state changed" event in one step.
    pub fn set_state_value(
        &self,
        device_id: DeviceId,
        state_type_id: StateTypeId,
        value: serde_json::Value,
    ) {
        let _ = self.sender.send(CoreMessage::SetStateValue {
            device_id,
            state_type_id,
            value,
        });
    }

    /// Deliver discovery results for a device class.
    pub fn devices_discovered(
        &self,
        device_class_id: DeviceClassId,
        descriptors: Vec<DeviceDescriptor>,
    ) {
        let _ = self.sender.send(CoreMessage::DevicesDiscovered {
            device_class_id,
            descriptors,
        });
    }

    /// Deliver the completion of an asynchronous device setup or edit.
    pub fn device_setup_finished(&self, device_id: DeviceId, result: Result<(), DeviceError>) {
        let _ = self
            .sender
            .send(CoreMessage::DeviceSetupFinished { device_id, result });
    }

    /// Deliver the completion of an asynchronous pairing confirmation.
    pub fn pairing_finished(
        &self,
        transaction_id: PairingTransactionId,
        result: Result<(), DeviceError>,
    ) {
        let _ = self.sender.send(CoreMessage::PairingFinished {
            transaction_id,
            result,
        });
    }

    /// Deliver the completion of an asynchronous action execution.
    pub fn action_finished(&self, action_id: ActionId, result: Result<(), DeviceError>) {
        let _ = self
            .sender
            .send(CoreMessage::ActionFinished { action_id, result });
    }
}
