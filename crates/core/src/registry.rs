//! Capability registry — device classes and vendors contributed by plugins.

use indexmap::IndexMap;
use tracing::debug;

use casahub_domain::device_class::DeviceClass;
use casahub_domain::error::DeviceError;
use casahub_domain::id::{DeviceClassId, EventTypeId, PluginId, VendorId};
use casahub_domain::vendor::Vendor;

/// Registry of every device class and vendor known to the hub.
///
/// Populated once per plugin at startup and read-shared afterwards.
/// Registration order is preserved; lookups that scan (such as
/// [`find_device_class_for_event`](Self::find_device_class_for_event))
/// resolve ties by that order, first match wins.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    vendors: IndexMap<VendorId, Vendor>,
    device_classes: IndexMap<DeviceClassId, DeviceClass>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a plugin's vendors and device classes into the registry.
    ///
    /// Validation is all-or-nothing: on any collision nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DuplicateDeviceClass`] when another plugin
    /// already registered one of the class ids.
    pub fn register_plugin(
        &mut self,
        plugin_id: PluginId,
        vendors: Vec<Vendor>,
        device_classes: Vec<DeviceClass>,
    ) -> Result<(), DeviceError> {
        for class in &device_classes {
            if self.device_classes.contains_key(&class.id()) {
                return Err(DeviceError::DuplicateDeviceClass(class.id()));
            }
        }
        for vendor in vendors {
            self.vendors.entry(vendor.id).or_insert(vendor);
        }
        for class in device_classes {
            debug!(plugin = %plugin_id, class = %class.name(), "registered device class");
            self.device_classes.insert(class.id(), class);
        }
        Ok(())
    }

    /// The device class with the given id, if registered.
    #[must_use]
    pub fn find_device_class(&self, id: DeviceClassId) -> Option<&DeviceClass> {
        self.device_classes.get(&id)
    }

    /// The first registered device class declaring the given event type,
    /// derived "state changed" events included.
    #[must_use]
    pub fn find_device_class_for_event(&self, event_type_id: EventTypeId) -> Option<&DeviceClass> {
        self.device_classes
            .values()
            .find(|class| class.has_event_type(event_type_id))
    }

    /// All registered device classes, in registration order.
    pub fn device_classes(&self) -> impl Iterator<Item = &DeviceClass> {
        self.device_classes.values()
    }

    /// All registered vendors, in registration order.
    pub fn vendors(&self) -> impl Iterator<Item = &Vendor> {
        self.vendors.values()
    }
}
