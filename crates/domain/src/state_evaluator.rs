//! State evaluators — boolean expression trees over current device state.
//!
//! A rule's state evaluator is checked against the *current* contents of the
//! device store, never against the triggering event. Evaluation needs a state
//! lookup supplied by the caller, keeping this module free of store access.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::ValueOperator;
use crate::id::{DeviceId, StateTypeId};

/// A single comparison against one device's current state value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub device_id: DeviceId,
    pub state_type_id: StateTypeId,
    pub operator: ValueOperator,
    pub value: Value,
}

impl StateDescriptor {
    /// Create a new state comparison.
    #[must_use]
    pub fn new(
        device_id: DeviceId,
        state_type_id: StateTypeId,
        operator: ValueOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            device_id,
            state_type_id,
            operator,
            value: value.into(),
        }
    }
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOperator {
    And,
    Or,
}

/// A boolean expression tree over current device states.
///
/// The empty tree ([`StateEvaluator::Always`]) evaluates to `true`, which is
/// the "always match" evaluator for event-only rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvaluator {
    /// No state condition; always true.
    #[default]
    Always,
    /// A single state comparison.
    Descriptor(StateDescriptor),
    /// Children combined with And/Or. An empty And group is true, an empty
    /// Or group is false (the usual identity elements).
    Group {
        operator: BoolOperator,
        children: Vec<StateEvaluator>,
    },
}

impl StateEvaluator {
    /// Evaluate the tree against current state values.
    ///
    /// `lookup` resolves a device's current value for a state type; a
    /// descriptor whose state cannot be resolved evaluates to `false`.
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(DeviceId, StateTypeId) -> Option<Value>,
    {
        match self {
            Self::Always => true,
            Self::Descriptor(d) => lookup(d.device_id, d.state_type_id)
                .is_some_and(|actual| d.operator.holds(&actual, &d.value)),
            Self::Group { operator, children } => match operator {
                BoolOperator::And => children.iter().all(|child| child.evaluate(lookup)),
                BoolOperator::Or => children.iter().any(|child| child.evaluate(lookup)),
            },
        }
    }

    /// Whether any descriptor in the tree references the given device.
    #[must_use]
    pub fn contains_device(&self, device_id: DeviceId) -> bool {
        match self {
            Self::Always => false,
            Self::Descriptor(d) => d.device_id == device_id,
            Self::Group { children, .. } => {
                children.iter().any(|child| child.contains_device(device_id))
            }
        }
    }

    /// Strip every descriptor referencing the given device from the tree.
    ///
    /// A stripped root descriptor leaves [`StateEvaluator::Always`] behind;
    /// group children are removed in place.
    pub fn remove_device(&mut self, device_id: DeviceId) {
        match self {
            Self::Always => {}
            Self::Descriptor(d) => {
                if d.device_id == device_id {
                    *self = Self::Always;
                }
            }
            Self::Group { children, .. } => {
                children.retain(
                    |child| !matches!(child, Self::Descriptor(d) if d.device_id == device_id),
                );
                for child in children.iter_mut() {
                    child.remove_device(device_id);
                }
            }
        }
    }
}
