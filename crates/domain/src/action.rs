//! Actions — commands dispatched to plugins for execution on a device.

use serde::{Deserialize, Serialize};

use crate::id::{ActionId, ActionTypeId, DeviceId};
use crate::param::{Param, ParamType};

/// Template describing one action a device class supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionType {
    pub id: ActionTypeId,
    pub name: String,
    #[serde(default)]
    pub param_types: Vec<ParamType>,
}

impl ActionType {
    /// Create an action template without parameters.
    #[must_use]
    pub fn new(id: ActionTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            param_types: Vec::new(),
        }
    }

    /// Create an action template with the given parameter templates.
    #[must_use]
    pub fn with_params(
        id: ActionTypeId,
        name: impl Into<String>,
        param_types: Vec<ParamType>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            param_types,
        }
    }
}

/// A command to be executed on one device.
///
/// The `id` is freshly generated per execution request and is the correlation
/// key for asynchronous completion notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub action_type_id: ActionTypeId,
    pub device_id: DeviceId,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Action {
    /// Create a new action with a fresh correlation id.
    #[must_use]
    pub fn new(action_type_id: ActionTypeId, device_id: DeviceId, params: Vec<Param>) -> Self {
        Self {
            id: ActionId::new(),
            action_type_id,
            device_id,
            params,
        }
    }

    /// Look up an action parameter value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&serde_json::Value> {
        crate::param::value_of(&self.params, name)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action({}, {})", self.action_type_id, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_fresh_correlation_id_per_action() {
        let action_type_id = ActionTypeId::new();
        let device_id = DeviceId::new();
        let a = Action::new(action_type_id, device_id, Vec::new());
        let b = Action::new(action_type_id, device_id, Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_roundtrip_action_through_serde_json() {
        let action = Action::new(
            ActionTypeId::new(),
            DeviceId::new(),
            vec![Param::new("power", true)],
        );
        let json = serde_json::to_string(&action).unwrap();
        let parsed: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }
}
