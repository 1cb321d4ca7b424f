//! Typed error taxonomies for device and rule operations.
//!
//! Two parallel result-code style enums cross the core boundary — one for
//! device/plugin operations, one for rule operations. All validation happens
//! before any mutation, so an `Err` always means the store is unchanged.

use crate::id::{
    ActionTypeId, DeviceClassId, DeviceDescriptorId, DeviceId, EventTypeId, PairingTransactionId,
    PluginId, RuleId, StateTypeId,
};

/// Errors for device lifecycle, setup, and action dispatch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("no configured device with id {0}")]
    DeviceNotFound(DeviceId),

    #[error("no device class with id {0}")]
    DeviceClassNotFound(DeviceClassId),

    #[error("device class is already registered: {0}")]
    DuplicateDeviceClass(DeviceClassId),

    #[error("device class declares no action type {0}")]
    ActionTypeNotFound(ActionTypeId),

    #[error("device class declares no event type {0}")]
    EventTypeNotFound(EventTypeId),

    #[error("device class declares no state type {0}")]
    StateTypeNotFound(StateTypeId),

    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("no plugin with id {0}")]
    PluginNotFound(PluginId),

    #[error("device setup failed")]
    SetupFailed,

    #[error("required hardware resource is not available")]
    HardwareNotAvailable,

    #[error("hardware failure reported by plugin")]
    HardwareFailure,

    #[error("device class does not support this creation method")]
    CreationMethodNotSupported,

    #[error("no pending pairing transaction with id {0}")]
    TransactionNotFound(PairingTransactionId),

    #[error("no discovered device descriptor with id {0}")]
    DeviceDescriptorNotFound(DeviceDescriptorId),

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Errors for rule management operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("no rule with id {0}")]
    RuleNotFound(RuleId),

    #[error("rule references unknown device {0}")]
    DeviceNotFound(DeviceId),

    #[error("rule references undeclared event type {0}")]
    EventTypeNotFound(EventTypeId),

    #[error("rule references undeclared action type {0}")]
    ActionTypeNotFound(ActionTypeId),

    #[error("rule id {0} is already in use")]
    InvalidRuleId(RuleId),

    #[error("storage failure: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_include_offending_id_in_device_error_message() {
        let id = DeviceId::new();
        let message = DeviceError::DeviceNotFound(id).to_string();
        assert!(message.contains(&id.to_string()));
    }

    #[test]
    fn should_include_offending_id_in_rule_error_message() {
        let id = RuleId::new();
        let message = RuleError::RuleNotFound(id).to_string();
        assert!(message.contains(&id.to_string()));
    }
}
