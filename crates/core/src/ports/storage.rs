//! Storage ports — repository traits for persistence.
//!
//! The on-disk layout belongs to the adapter; the core only requires
//! round-trip fidelity of the records below, including their order.

use std::future::Future;

use serde::{Deserialize, Serialize};

use casahub_domain::device::Device;
use casahub_domain::id::{DeviceClassId, DeviceId, PluginId, RuleId};
use casahub_domain::param::Param;
use casahub_domain::rule::Rule;

/// Errors an adapter may surface from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported storage version {found}, expected {expected}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// The persisted shape of a configured device.
///
/// Live state values are deliberately absent; states are re-initialized to
/// their defaults on every device setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    pub device_class_id: DeviceClassId,
    pub plugin_id: PluginId,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl From<&Device> for DeviceRecord {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id,
            device_class_id: device.device_class_id,
            plugin_id: device.plugin_id,
            name: device.name.clone(),
            params: device.params.clone(),
        }
    }
}

/// Repository for persisting configured devices.
pub trait DeviceRepository {
    /// Load all persisted device records, in stored order.
    fn load(&self) -> impl Future<Output = Result<Vec<DeviceRecord>, StorageError>> + Send;

    /// Replace the persisted device set with the given records.
    fn store(
        &self,
        devices: Vec<DeviceRecord>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: DeviceRepository + Send + Sync> DeviceRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Vec<DeviceRecord>, StorageError>> + Send {
        (**self).load()
    }

    fn store(
        &self,
        devices: Vec<DeviceRecord>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).store(devices)
    }
}

/// Repository for persisting rules.
pub trait RuleRepository {
    /// Load all persisted rules, in stored order.
    fn load(&self) -> impl Future<Output = Result<Vec<Rule>, StorageError>> + Send;

    /// Insert or replace one rule, preserving its position when replacing.
    fn save(&self, rule: Rule) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete one rule's persisted state.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Vec<Rule>, StorageError>> + Send {
        (**self).load()
    }

    fn save(&self, rule: Rule) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).save(rule)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_record_from_device_without_states() {
        let device = Device::new(
            DeviceId::new(),
            DeviceClassId::new(),
            PluginId::new(),
            "Desk Lamp",
            vec![Param::new("label", "desk")],
        );
        let record = DeviceRecord::from(&device);
        assert_eq!(record.id, device.id);
        assert_eq!(record.name, "Desk Lamp");
        assert_eq!(record.params, device.params);
    }

    #[test]
    fn should_roundtrip_record_through_serde_json() {
        let record = DeviceRecord {
            id: DeviceId::new(),
            device_class_id: DeviceClassId::new(),
            plugin_id: PluginId::new(),
            name: "Thermostat".to_string(),
            params: vec![Param::new("zone", "living room")],
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: DeviceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
