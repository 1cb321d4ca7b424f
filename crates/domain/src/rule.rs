//! Rules — event descriptors, a state evaluator, and the actions they trigger.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::descriptor::EventDescriptor;
use crate::event::Event;
use crate::id::{DeviceId, RuleId};
use crate::state_evaluator::StateEvaluator;

/// An automation rule owned by the rule engine.
///
/// A rule fires when an incoming event matches one of its event descriptors
/// and its state evaluator holds against current device state; all of its
/// actions are then collected for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    #[serde(default)]
    pub event_descriptors: Vec<EventDescriptor>,
    #[serde(default)]
    pub state_evaluator: StateEvaluator,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Rule {
    /// Create a new rule.
    #[must_use]
    pub fn new(
        id: RuleId,
        event_descriptors: Vec<EventDescriptor>,
        state_evaluator: StateEvaluator,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            id,
            event_descriptors,
            state_evaluator,
            actions,
        }
    }

    /// Whether any of this rule's event descriptors matches the event.
    #[must_use]
    pub fn contains_event(&self, event: &Event) -> bool {
        self.event_descriptors.iter().any(|ed| ed.matches(event))
    }

    /// Whether the rule references the device in its descriptors, state
    /// evaluator, or actions.
    #[must_use]
    pub fn references_device(&self, device_id: DeviceId) -> bool {
        self.event_descriptors.iter().any(|ed| ed.device_id == device_id)
            || self.state_evaluator.contains_device(device_id)
            || self.actions.iter().any(|a| a.device_id == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ParamDescriptor, ValueOperator};
    use crate::id::{ActionTypeId, EventTypeId, StateTypeId};
    use crate::param::Param;
    use crate::state_evaluator::StateDescriptor;

    #[test]
    fn should_contain_event_matched_by_any_descriptor() {
        let event_type_id = EventTypeId::new();
        let device_id = DeviceId::new();
        let rule = Rule::new(
            RuleId::new(),
            vec![
                EventDescriptor::new(EventTypeId::new(), device_id, Vec::new()),
                EventDescriptor::new(event_type_id, device_id, Vec::new()),
            ],
            StateEvaluator::Always,
            Vec::new(),
        );
        let event = Event::new(event_type_id, device_id, Vec::new());
        assert!(rule.contains_event(&event));
    }

    #[test]
    fn should_not_contain_event_when_params_disagree() {
        let event_type_id = EventTypeId::new();
        let device_id = DeviceId::new();
        let rule = Rule::new(
            RuleId::new(),
            vec![EventDescriptor::new(
                event_type_id,
                device_id,
                vec![ParamDescriptor::new("value", true, ValueOperator::Equals)],
            )],
            StateEvaluator::Always,
            Vec::new(),
        );
        let event = Event::new(event_type_id, device_id, vec![Param::new("value", false)]);
        assert!(!rule.contains_event(&event));
    }

    #[test]
    fn should_reference_device_used_in_actions() {
        let device_id = DeviceId::new();
        let rule = Rule::new(
            RuleId::new(),
            Vec::new(),
            StateEvaluator::Always,
            vec![Action::new(ActionTypeId::new(), device_id, Vec::new())],
        );
        assert!(rule.references_device(device_id));
        assert!(!rule.references_device(DeviceId::new()));
    }

    #[test]
    fn should_reference_device_used_in_state_evaluator() {
        let device_id = DeviceId::new();
        let rule = Rule::new(
            RuleId::new(),
            Vec::new(),
            StateEvaluator::Descriptor(StateDescriptor::new(
                device_id,
                StateTypeId::new(),
                ValueOperator::Equals,
                true,
            )),
            Vec::new(),
        );
        assert!(rule.references_device(device_id));
    }

    #[test]
    fn should_roundtrip_rule_through_serde_json() {
        let device_id = DeviceId::new();
        let rule = Rule::new(
            RuleId::new(),
            vec![EventDescriptor::new(EventTypeId::new(), device_id, Vec::new())],
            StateEvaluator::Always,
            vec![Action::new(ActionTypeId::new(), device_id, Vec::new())],
        );
        let json = serde_json::to_string(&rule).unwrap();
        let parsed: Rule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }
}
