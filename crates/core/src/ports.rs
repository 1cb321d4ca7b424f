//! Port definitions — traits the outside world implements.
//!
//! Ports are the boundaries between the application core and everything
//! else: device plugins on one side, persistence adapters on the other.
//! They are defined here so both the core and the adapter/plugin crates can
//! depend on them without creating circular dependencies.

pub mod plugin;
pub mod storage;

pub use plugin::{DevicePlugin, ExecuteStatus, PluginHandle, SetupStatus};
pub use storage::{DeviceRecord, DeviceRepository, RuleRepository, StorageError};
