//! Rule engine — stores rules, matches events, and collects actions.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use casahub_domain::action::Action;
use casahub_domain::device_class::DeviceClass;
use casahub_domain::error::RuleError;
use casahub_domain::event::Event;
use casahub_domain::id::{DeviceId, RuleId, StateTypeId};
use casahub_domain::rule::Rule;

use crate::ports::storage::RuleRepository;

/// Exclusive owner of all [`Rule`]s.
///
/// Keeps both an id map and an explicit ordered id list: enumeration and
/// evaluation follow insertion order, never map iteration order.
pub struct RuleEngine<R> {
    rules: HashMap<RuleId, Rule>,
    order: Vec<RuleId>,
    repo: R,
}

impl<R: RuleRepository> RuleEngine<R> {
    /// Create an empty engine backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            rules: HashMap::new(),
            order: Vec::new(),
            repo,
        }
    }

    /// Load persisted rules, preserving their stored order.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Storage`] when the repository fails.
    pub async fn load(&mut self) -> Result<(), RuleError> {
        let rules = self
            .repo
            .load()
            .await
            .map_err(|e| RuleError::Storage(e.to_string()))?;
        for rule in rules {
            self.order.push(rule.id);
            self.rules.insert(rule.id, rule);
        }
        Ok(())
    }

    /// Validate and append a rule.
    ///
    /// `class_of` resolves a configured device to its device class; it
    /// returns `None` for unknown devices. Validation is all-or-nothing: any
    /// unresolved reference rejects the whole rule and nothing is stored.
    ///
    /// # Errors
    ///
    /// - [`RuleError::InvalidRuleId`] when the id is already in use
    /// - [`RuleError::DeviceNotFound`] for a descriptor or action naming an
    ///   unknown device
    /// - [`RuleError::EventTypeNotFound`] when the device's class does not
    ///   declare the descriptor's event type (derived ones included)
    /// - [`RuleError::ActionTypeNotFound`] when the device's class does not
    ///   declare an action's type
    /// - [`RuleError::Storage`] when persisting fails
    pub async fn add_rule<F>(&mut self, rule: Rule, class_of: F) -> Result<(), RuleError>
    where
        F: Fn(DeviceId) -> Option<DeviceClass>,
    {
        if self.rules.contains_key(&rule.id) {
            return Err(RuleError::InvalidRuleId(rule.id));
        }
        for descriptor in &rule.event_descriptors {
            let class = class_of(descriptor.device_id)
                .ok_or(RuleError::DeviceNotFound(descriptor.device_id))?;
            if !class.has_event_type(descriptor.event_type_id) {
                return Err(RuleError::EventTypeNotFound(descriptor.event_type_id));
            }
        }
        for action in &rule.actions {
            let class =
                class_of(action.device_id).ok_or(RuleError::DeviceNotFound(action.device_id))?;
            if !class.has_action_type(action.action_type_id) {
                return Err(RuleError::ActionTypeNotFound(action.action_type_id));
            }
        }

        self.repo
            .save(rule.clone())
            .await
            .map_err(|e| RuleError::Storage(e.to_string()))?;
        self.order.push(rule.id);
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    /// Remove a rule from the engine and from persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RuleNotFound`] for an unknown id, or
    /// [`RuleError::Storage`] when the repository fails.
    pub async fn remove_rule(&mut self, id: RuleId) -> Result<(), RuleError> {
        if !self.rules.contains_key(&id) {
            return Err(RuleError::RuleNotFound(id));
        }
        self.repo
            .delete(id)
            .await
            .map_err(|e| RuleError::Storage(e.to_string()))?;
        self.rules.remove(&id);
        self.order.retain(|rule_id| *rule_id != id);
        Ok(())
    }

    /// Evaluate all rules for one event and collect the actions to execute.
    ///
    /// Rules are scanned in insertion order; a rule contributes all of its
    /// actions when any of its event descriptors matches the event and its
    /// state evaluator holds against current device state. There is no
    /// short-circuiting across rules.
    pub fn evaluate_event<F>(&self, event: &Event, state_lookup: &F) -> Vec<Action>
    where
        F: Fn(DeviceId, StateTypeId) -> Option<Value>,
    {
        let mut actions = Vec::new();
        for id in &self.order {
            let rule = &self.rules[id];
            if rule.contains_event(event) && rule.state_evaluator.evaluate(state_lookup) {
                debug!(rule = %id, event = %event, "rule matched");
                actions.extend(rule.actions.iter().cloned());
            }
        }
        actions
    }

    /// Ids of all rules referencing the given device, in insertion order.
    #[must_use]
    pub fn find_rules(&self, device_id: DeviceId) -> Vec<RuleId> {
        self.order
            .iter()
            .filter(|id| self.rules[id].references_device(device_id))
            .copied()
            .collect()
    }

    /// Strip every reference to a device from one rule, in place.
    ///
    /// Matching event descriptors, state evaluator leaves, and actions are
    /// removed; the rule itself always survives. Best-effort repair, not
    /// cascading deletion.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::RuleNotFound`] for an unknown rule id, or
    /// [`RuleError::Storage`] when persisting the repaired rule fails.
    pub async fn remove_device_from_rule(
        &mut self,
        id: RuleId,
        device_id: DeviceId,
    ) -> Result<(), RuleError> {
        let rule = self.rules.get_mut(&id).ok_or(RuleError::RuleNotFound(id))?;
        rule.event_descriptors.retain(|ed| ed.device_id != device_id);
        rule.state_evaluator.remove_device(device_id);
        rule.actions.retain(|a| a.device_id != device_id);
        let repaired = rule.clone();
        self.repo
            .save(repaired)
            .await
            .map_err(|e| RuleError::Storage(e.to_string()))
    }

    /// The rule with the given id.
    #[must_use]
    pub fn find_rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// All rules, in insertion order.
    #[must_use]
    pub fn rules(&self) -> Vec<&Rule> {
        self.order.iter().map(|id| &self.rules[id]).collect()
    }

    /// All rule ids, in insertion order.
    #[must_use]
    pub fn rule_ids(&self) -> &[RuleId] {
        &self.order
    }
}
