//! Events — instantaneous facts emitted by plugins on behalf of devices.

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, EventTypeId};
use crate::param::{Param, ParamType};
use crate::time::{self, Timestamp};

/// Template describing one event a device class can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub id: EventTypeId,
    pub name: String,
    #[serde(default)]
    pub param_types: Vec<ParamType>,
}

impl EventType {
    /// Create an event template without parameters.
    #[must_use]
    pub fn new(id: EventTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            param_types: Vec::new(),
        }
    }

    /// Create an event template with the given parameter templates.
    #[must_use]
    pub fn with_params(
        id: EventTypeId,
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

/// Something that happened on a device at a point in time.
///
/// The timestamp records when the event was created and never participates
/// in rule matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type_id: EventTypeId,
    pub device_id: DeviceId,
    #[serde(default)]
    pub params: Vec<Param>,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(event_type_id: EventTypeId, device_id: DeviceId, params: Vec<Param>) -> Self {
        Self {
            event_type_id,
            device_id,
            params,
            timestamp: time::now(),
        }
    }

    /// Look up an event parameter value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&serde_json::Value> {
        crate::param::value_of(&self.params, name)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event({}, {})", self.event_type_id, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_look_up_event_param_by_name() {
        let event = Event::new(
            EventTypeId::new(),
            DeviceId::new(),
            vec![Param::new("value", true)],
        );
        assert_eq!(event.param("value"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(event.param("other"), None);
    }

    #[test]
    fn should_roundtrip_event_through_serde_json() {
        let event = Event::new(
            EventTypeId::new(),
            DeviceId::new(),
            vec![Param::new("value", 21)],
        );
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type_id, event.event_type_id);
        assert_eq!(parsed.device_id, event.device_id);
        assert_eq!(parsed.params, event.params);
    }
}
