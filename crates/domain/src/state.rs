//! States — live values a device holds, templated by its device class.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{DeviceId, StateTypeId};

/// Template describing one state a device class declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateType {
    pub id: StateTypeId,
    pub name: String,
    /// Value a fresh device starts out with.
    pub default_value: Value,
}

impl StateType {
    /// Create a new state template.
    #[must_use]
    pub fn new(id: StateTypeId, name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self {
            id,
            name: name.into(),
            default_value: default_value.into(),
        }
    }
}

/// A live state value held by one configured device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub state_type_id: StateTypeId,
    pub device_id: DeviceId,
    pub value: Value,
}

impl State {
    /// Create a state with the given value.
    #[must_use]
    pub fn new(state_type_id: StateTypeId, device_id: DeviceId, value: impl Into<Value>) -> Self {
        Self {
            state_type_id,
            device_id,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "state({}, {})", self.state_type_id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_state_through_serde_json() {
        let state = State::new(StateTypeId::new(), DeviceId::new(), false);
        let json = serde_json::to_string(&state).unwrap();
        let parsed: State = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }
}
