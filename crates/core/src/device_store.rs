//! Device store — owns configured devices and their live state values.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use casahub_domain::device::Device;
use casahub_domain::device_class::DeviceClass;
use casahub_domain::error::DeviceError;
use casahub_domain::event::Event;
use casahub_domain::id::{DeviceClassId, DeviceId, StateTypeId};
use casahub_domain::param::{Param, ParamType};
use casahub_domain::state::State;

use crate::ports::storage::{DeviceRecord, DeviceRepository};
use crate::registry::CapabilityRegistry;

/// Check that every parameter a class declares has a supplied value.
///
/// Type compatibility is not enforced here, a known gap kept on purpose.
///
/// # Errors
///
/// Returns [`DeviceError::MissingParameter`] naming the first absent one.
pub fn validate_params(param_types: &[ParamType], params: &[Param]) -> Result<(), DeviceError> {
    for param_type in param_types {
        if !params.iter().any(|p| p.name == param_type.name) {
            return Err(DeviceError::MissingParameter(param_type.name.clone()));
        }
    }
    Ok(())
}

/// Give a device one state per state type of its class, at default values.
pub fn init_states(device: &mut Device, class: &DeviceClass) {
    device.states = class
        .state_types()
        .iter()
        .map(|st| State::new(st.id, device.id, st.default_value.clone()))
        .collect();
}

/// Exclusive owner of all configured [`Device`]s.
///
/// Devices are kept in insertion order with an id index for the per-event
/// hot-path lookups. Every successful mutation is persisted through the
/// repository before it becomes visible.
pub struct DeviceStore<R> {
    devices: IndexMap<DeviceId, Device>,
    repo: R,
}

impl<R: DeviceRepository> DeviceStore<R> {
    /// Create an empty store backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            devices: IndexMap::new(),
            repo,
        }
    }

    /// Load persisted devices, re-initializing their states to defaults.
    ///
    /// Records whose device class is no longer registered (the plugin was
    /// removed) are skipped with a warning; they stay persisted untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Storage`] when the repository fails.
    pub async fn load(&mut self, registry: &CapabilityRegistry) -> Result<(), DeviceError> {
        let records = self
            .repo
            .load()
            .await
            .map_err(|e| DeviceError::Storage(e.to_string()))?;
        for record in records {
            let Some(class) = registry.find_device_class(record.device_class_id) else {
                warn!(device = %record.id, class = %record.device_class_id,
                    "skipping stored device with unknown device class");
                continue;
            };
            let mut device = Device::new(
                record.id,
                record.device_class_id,
                record.plugin_id,
                record.name,
                record.params,
            );
            init_states(&mut device, class);
            self.devices.insert(device.id, device);
        }
        Ok(())
    }

    /// Insert a fully set-up device and persist the store.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Storage`] when persisting fails; the device is
    /// kept in memory either way, matching the caller's completed setup.
    pub async fn insert(&mut self, device: Device) -> Result<(), DeviceError> {
        self.devices.insert(device.id, device);
        self.persist().await
    }

    /// The device with the given id.
    #[must_use]
    pub fn find(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// All configured devices, in insertion order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// All devices of the given class, in insertion order.
    #[must_use]
    pub fn find_by_class(&self, device_class_id: DeviceClassId) -> Vec<&Device> {
        self.devices
            .values()
            .filter(|d| d.device_class_id == device_class_id)
            .collect()
    }

    /// Remove a device and persist the store.
    ///
    /// The removed device is returned so the caller can notify its plugin
    /// and decide what to do about rules that reference it.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`] for an unknown id, or
    /// [`DeviceError::Storage`] when persisting fails.
    pub async fn remove(&mut self, id: DeviceId) -> Result<Device, DeviceError> {
        let device = self
            .devices
            .shift_remove(&id)
            .ok_or(DeviceError::DeviceNotFound(id))?;
        self.persist().await?;
        Ok(device)
    }

    /// Replace a device's parameters and persist the store.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`] for an unknown id, or
    /// [`DeviceError::Storage`] when persisting fails.
    pub async fn set_params(&mut self, id: DeviceId, params: Vec<Param>) -> Result<(), DeviceError> {
        let device = self
            .devices
            .get_mut(&id)
            .ok_or(DeviceError::DeviceNotFound(id))?;
        device.params = params;
        self.persist().await
    }

    /// Update one state value and synthesize the matching "state changed"
    /// event in the same step, so no evaluation can see a stale state.
    ///
    /// State values are live data and are not persisted.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`] or
    /// [`DeviceError::StateTypeNotFound`].
    pub fn set_state_value(
        &mut self,
        device_id: DeviceId,
        state_type_id: StateTypeId,
        value: Value,
    ) -> Result<Event, DeviceError> {
        let device = self
            .devices
            .get_mut(&device_id)
            .ok_or(DeviceError::DeviceNotFound(device_id))?;
        device.set_state_value(state_type_id, value.clone())?;
        Ok(Event::new(
            state_type_id.as_event_type_id(),
            device_id,
            vec![Param::new("value", value)],
        ))
    }

    /// Current value of a device's state, for rule evaluation.
    #[must_use]
    pub fn state_value(&self, device_id: DeviceId, state_type_id: StateTypeId) -> Option<Value> {
        self.devices
            .get(&device_id)
            .and_then(|d| d.state_value(state_type_id))
            .cloned()
    }

    async fn persist(&self) -> Result<(), DeviceError> {
        let records: Vec<DeviceRecord> = self.devices.values().map(DeviceRecord::from).collect();
        self.repo
            .store(records)
            .await
            .map_err(|e| DeviceError::Storage(e.to_string()))
    }
}
