//! Event descriptors — a rule's pattern for matching incoming events.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;
use crate::id::{DeviceId, EventTypeId};
use crate::param::Param;

/// Comparison operator applied to a parameter or state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
}

impl ValueOperator {
    /// Whether `actual <op> expected` holds.
    ///
    /// JSON numbers compare numerically regardless of integer/float
    /// representation. Ordering operators are defined for numbers and
    /// strings; on any other type they evaluate to `false`.
    #[must_use]
    pub fn holds(self, actual: &Value, expected: &Value) -> bool {
        match self {
            Self::Equals => values_equal(actual, expected),
            Self::NotEquals => !values_equal(actual, expected),
            Self::GreaterThan => matches!(compare(actual, expected), Some(Ordering::Greater)),
            Self::LessThan => matches!(compare(actual, expected), Some(Ordering::Less)),
            Self::GreaterOrEqual => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::LessOrEqual => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

/// A named comparison against an event parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,
    pub value: Value,
    pub operator: ValueOperator,
}

impl ParamDescriptor {
    /// Create a new parameter comparison.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>, operator: ValueOperator) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            operator,
        }
    }

    /// Whether the same-named parameter in `params` satisfies the operator.
    ///
    /// A missing parameter never matches.
    #[must_use]
    pub fn matches(&self, params: &[Param]) -> bool {
        crate::param::value_of(params, &self.name)
            .is_some_and(|actual| self.operator.holds(actual, &self.value))
    }
}

/// A rule's template for matching incoming events.
///
/// Matches an event iff event type and device are equal and every parameter
/// descriptor holds against the event's same-named parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub event_type_id: EventTypeId,
    pub device_id: DeviceId,
    #[serde(default)]
    pub param_descriptors: Vec<ParamDescriptor>,
}

impl EventDescriptor {
    /// Create a new event descriptor.
    #[must_use]
    pub fn new(
        event_type_id: EventTypeId,
        device_id: DeviceId,
        param_descriptors: Vec<ParamDescriptor>,
    ) -> Self {
        Self {
            event_type_id,
            device_id,
            param_descriptors,
        }
    }

    /// Check whether this descriptor matches a given event.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.event_type_id == event.event_type_id
            && self.device_id == event.device_id
            && self.param_descriptors.iter().all(|pd| pd.matches(&event.params))
    }
}

impl std::fmt::Display for EventDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event_descriptor({}, {})", self.event_type_id, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type_id: EventTypeId, device_id: DeviceId, params: Vec<Param>) -> Event {
        Event::new(event_type_id, device_id, params)
    }

    #[test]
    fn should_compare_integers_and_floats_numerically() {
        assert!(ValueOperator::Equals.holds(&Value::from(21), &Value::from(21.0)));
        assert!(ValueOperator::GreaterThan.holds(&Value::from(21.5), &Value::from(21)));
        assert!(ValueOperator::LessOrEqual.holds(&Value::from(21), &Value::from(21.0)));
    }

    #[test]
    fn should_compare_strings_lexicographically() {
        assert!(ValueOperator::LessThan.holds(&Value::from("alpha"), &Value::from("beta")));
        assert!(ValueOperator::GreaterOrEqual.holds(&Value::from("beta"), &Value::from("beta")));
    }

    #[test]
    fn should_not_order_booleans() {
        assert!(!ValueOperator::GreaterThan.holds(&Value::Bool(true), &Value::Bool(false)));
        assert!(!ValueOperator::LessOrEqual.holds(&Value::Bool(true), &Value::Bool(true)));
        assert!(ValueOperator::Equals.holds(&Value::Bool(true), &Value::Bool(true)));
    }

    #[test]
    fn should_not_match_missing_param() {
        let pd = ParamDescriptor::new("value", true, ValueOperator::Equals);
        assert!(!pd.matches(&[Param::new("other", true)]));
    }

    #[test]
    fn should_match_event_when_type_device_and_params_agree() {
        let event_type_id = EventTypeId::new();
        let device_id = DeviceId::new();
        let descriptor = EventDescriptor::new(
            event_type_id,
            device_id,
            vec![ParamDescriptor::new("value", true, ValueOperator::Equals)],
        );
        let e = event(event_type_id, device_id, vec![Param::new("value", true)]);
        assert!(descriptor.matches(&e));
    }

    #[test]
    fn should_not_match_event_when_param_operator_fails() {
        let event_type_id = EventTypeId::new();
        let device_id = DeviceId::new();
        let descriptor = EventDescriptor::new(
            event_type_id,
            device_id,
            vec![ParamDescriptor::new("value", true, ValueOperator::Equals)],
        );
        let e = event(event_type_id, device_id, vec![Param::new("value", false)]);
        assert!(!descriptor.matches(&e));
    }

    #[test]
    fn should_not_match_event_from_other_device() {
        let event_type_id = EventTypeId::new();
        let descriptor = EventDescriptor::new(event_type_id, DeviceId::new(), Vec::new());
        let e = event(event_type_id, DeviceId::new(), Vec::new());
        assert!(!descriptor.matches(&e));
    }

    #[test]
    fn should_not_match_event_of_other_type() {
        let device_id = DeviceId::new();
        let descriptor = EventDescriptor::new(EventTypeId::new(), device_id, Vec::new());
        let e = event(EventTypeId::new(), device_id, Vec::new());
        assert!(!descriptor.matches(&e));
    }

    #[test]
    fn should_match_event_without_param_descriptors() {
        let event_type_id = EventTypeId::new();
        let device_id = DeviceId::new();
        let descriptor = EventDescriptor::new(event_type_id, device_id, Vec::new());
        let e = event(event_type_id, device_id, vec![Param::new("value", 3)]);
        assert!(descriptor.matches(&e));
    }

    #[test]
    fn should_roundtrip_descriptor_through_serde_json() {
        let descriptor = EventDescriptor::new(
            EventTypeId::new(),
            DeviceId::new(),
            vec![ParamDescriptor::new("value", 30, ValueOperator::GreaterThan)],
        );
        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: EventDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, descriptor);
    }
}
