//! Device — a configured instance of a device class.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeviceError;
use crate::id::{DeviceClassId, DeviceId, PluginId, StateTypeId};
use crate::param::Param;
use crate::state::State;

/// A physical or virtual thing configured in the hub.
///
/// Devices are created and mutated only through the device store; plugins and
/// the rule engine see them by reference. The `states` list holds exactly one
/// entry per state type the device's class declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub device_class_id: DeviceClassId,
    pub plugin_id: PluginId,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub states: Vec<State>,
}

impl Device {
    /// Create a device without states; the store fills them in at setup.
    #[must_use]
    pub fn new(
        id: DeviceId,
        device_class_id: DeviceClassId,
        plugin_id: PluginId,
        name: impl Into<String>,
        params: Vec<Param>,
    ) -> Self {
        Self {
            id,
            device_class_id,
            plugin_id,
            name: name.into(),
            params,
            states: Vec::new(),
        }
    }

    /// Current value of the given state, if the device holds it.
    #[must_use]
    pub fn state_value(&self, state_type_id: StateTypeId) -> Option<&Value> {
        self.states
            .iter()
            .find(|s| s.state_type_id == state_type_id)
            .map(|s| &s.value)
    }

    /// Overwrite the value of an existing state.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::StateTypeNotFound`] when the device's class
    /// declares no such state.
    pub fn set_state_value(
        &mut self,
        state_type_id: StateTypeId,
        value: Value,
    ) -> Result<(), DeviceError> {
        let state = self
            .states
            .iter_mut()
            .find(|s| s.state_type_id == state_type_id)
            .ok_or(DeviceError::StateTypeNotFound(state_type_id))?;
        state.value = value;
        Ok(())
    }

    /// Look up a configuration parameter value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        crate::param::value_of(&self.params, name)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_with_power_state(state_type_id: StateTypeId) -> Device {
        let mut device = Device::new(
            DeviceId::new(),
            DeviceClassId::new(),
            PluginId::new(),
            "Desk Lamp",
            vec![Param::new("label", "desk")],
        );
        device.states = vec![State::new(state_type_id, device.id, false)];
        device
    }

    #[test]
    fn should_read_back_state_value() {
        let state_type_id = StateTypeId::new();
        let device = device_with_power_state(state_type_id);
        assert_eq!(device.state_value(state_type_id), Some(&Value::Bool(false)));
    }

    #[test]
    fn should_update_existing_state_value() {
        let state_type_id = StateTypeId::new();
        let mut device = device_with_power_state(state_type_id);
        device
            .set_state_value(state_type_id, Value::Bool(true))
            .unwrap();
        assert_eq!(device.state_value(state_type_id), Some(&Value::Bool(true)));
    }

    #[test]
    fn should_reject_update_of_undeclared_state() {
        let mut device = device_with_power_state(StateTypeId::new());
        let unknown = StateTypeId::new();
        let result = device.set_state_value(unknown, Value::Bool(true));
        assert_eq!(result, Err(DeviceError::StateTypeNotFound(unknown)));
    }

    #[test]
    fn should_look_up_param_by_name() {
        let device = device_with_power_state(StateTypeId::new());
        assert_eq!(device.param("label"), Some(&Value::from("desk")));
        assert_eq!(device.param("missing"), None);
    }
}
