//! Device classes — immutable capability templates contributed by plugins.
//!
//! A `DeviceClass` describes what parameters, states, events, and actions a
//! device of this class has, how devices of this class are created, and how
//! pairing works. It never represents an actual device; see
//! [`Device`](crate::device::Device) for configured instances.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::action::ActionType;
use crate::event::EventType;
use crate::id::{ActionTypeId, DeviceClassId, DeviceDescriptorId, EventTypeId, PluginId, StateTypeId, VendorId};
use crate::param::{Param, ParamType};
use crate::state::StateType;

/// How devices of a class come into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateMethod {
    /// Created directly by the user supplying all parameters.
    User,
    /// Created from a candidate reported by plugin discovery.
    Discovery,
    /// Created automatically by the plugin itself.
    Auto,
}

/// The pairing interaction a class requires during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupMethod {
    /// No interaction needed; the device works immediately.
    JustAdd,
    /// The device displays a PIN the user must read off.
    DisplayPin,
    /// The user must enter a PIN into the device.
    EnterPin,
    /// The user must press a physical button on the device.
    PushButton,
}

/// Immutable description of a class of devices.
///
/// Plugins hardcode the UUIDs of their classes; an id must never change or
/// the class will appear as a brand new one to the rest of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceClass {
    id: DeviceClassId,
    vendor_id: VendorId,
    plugin_id: PluginId,
    name: String,
    param_types: Vec<ParamType>,
    discovery_param_types: Vec<ParamType>,
    state_types: Vec<StateType>,
    event_types: Vec<EventType>,
    action_types: Vec<ActionType>,
    create_methods: HashSet<CreateMethod>,
    setup_method: SetupMethod,
    pairing_info: String,
}

impl DeviceClass {
    /// Start building a device class.
    ///
    /// Creation method defaults to [`CreateMethod::User`] and setup method
    /// to [`SetupMethod::JustAdd`].
    #[must_use]
    pub fn builder(id: DeviceClassId, vendor_id: VendorId, plugin_id: PluginId) -> DeviceClassBuilder {
        DeviceClassBuilder {
            class: Self {
                id,
                vendor_id,
                plugin_id,
                name: String::new(),
                param_types: Vec::new(),
                discovery_param_types: Vec::new(),
                state_types: Vec::new(),
                event_types: Vec::new(),
                action_types: Vec::new(),
                create_methods: HashSet::from([CreateMethod::User]),
                setup_method: SetupMethod::JustAdd,
                pairing_info: String::new(),
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> DeviceClassId {
        self.id
    }

    #[must_use]
    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    #[must_use]
    pub fn plugin_id(&self) -> PluginId {
        self.plugin_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn param_types(&self) -> &[ParamType] {
        &self.param_types
    }

    #[must_use]
    pub fn discovery_param_types(&self) -> &[ParamType] {
        &self.discovery_param_types
    }

    #[must_use]
    pub fn state_types(&self) -> &[StateType] {
        &self.state_types
    }

    #[must_use]
    pub fn action_types(&self) -> &[ActionType] {
        &self.action_types
    }

    #[must_use]
    pub fn create_methods(&self) -> &HashSet<CreateMethod> {
        &self.create_methods
    }

    #[must_use]
    pub fn setup_method(&self) -> SetupMethod {
        self.setup_method
    }

    #[must_use]
    pub fn pairing_info(&self) -> &str {
        &self.pairing_info
    }

    /// All event types of this class: the explicitly declared ones unioned
    /// with one derived "&lt;state&gt; changed" event per state type.
    ///
    /// A derived event reuses its state type's UUID and carries a single
    /// `value` parameter. The union is recomputed on every call so it can
    /// never go stale against the state list.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        let mut all = self.event_types.clone();
        for state_type in &self.state_types {
            all.push(EventType::with_params(
                state_type.id.as_event_type_id(),
                format!("{} changed", state_type.name),
                vec![ParamType::new("value")],
            ));
        }
        all
    }

    /// Whether this class declares the given event type, derived ones included.
    #[must_use]
    pub fn has_event_type(&self, id: EventTypeId) -> bool {
        self.event_types().iter().any(|et| et.id == id)
    }

    /// Whether this class declares the given action type.
    #[must_use]
    pub fn has_action_type(&self, id: ActionTypeId) -> bool {
        self.action_types.iter().any(|at| at.id == id)
    }

    /// Look up a declared state type.
    #[must_use]
    pub fn state_type(&self, id: StateTypeId) -> Option<&StateType> {
        self.state_types.iter().find(|st| st.id == id)
    }

    /// Whether devices of this class can be created the given way.
    #[must_use]
    pub fn supports_create_method(&self, method: CreateMethod) -> bool {
        self.create_methods.contains(&method)
    }
}

/// Step-by-step builder for [`DeviceClass`].
#[derive(Debug)]
pub struct DeviceClassBuilder {
    class: DeviceClass,
}

impl DeviceClassBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.class.name = name.into();
        self
    }

    #[must_use]
    pub fn param_types(mut self, param_types: Vec<ParamType>) -> Self {
        self.class.param_types = param_types;
        self
    }

    #[must_use]
    pub fn discovery_param_types(mut self, param_types: Vec<ParamType>) -> Self {
        self.class.discovery_param_types = param_types;
        self
    }

    #[must_use]
    pub fn state_types(mut self, state_types: Vec<StateType>) -> Self {
        self.class.state_types = state_types;
        self
    }

    #[must_use]
    pub fn event_types(mut self, event_types: Vec<EventType>) -> Self {
        self.class.event_types = event_types;
        self
    }

    #[must_use]
    pub fn action_types(mut self, action_types: Vec<ActionType>) -> Self {
        self.class.action_types = action_types;
        self
    }

    #[must_use]
    pub fn create_methods(mut self, methods: impl IntoIterator<Item = CreateMethod>) -> Self {
        self.class.create_methods = methods.into_iter().collect();
        self
    }

    #[must_use]
    pub fn setup_method(mut self, method: SetupMethod) -> Self {
        self.class.setup_method = method;
        self
    }

    #[must_use]
    pub fn pairing_info(mut self, info: impl Into<String>) -> Self {
        self.class.pairing_info = info.into();
        self
    }

    #[must_use]
    pub fn build(self) -> DeviceClass {
        self.class
    }
}

/// A candidate device reported by plugin discovery, with pre-filled params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: DeviceDescriptorId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl DeviceDescriptor {
    /// Create a descriptor with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            id: DeviceDescriptorId::new(),
            title: title.into(),
            description: description.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp_class() -> DeviceClass {
        DeviceClass::builder(DeviceClassId::new(), VendorId::new(), PluginId::new())
            .name("Lamp")
            .state_types(vec![StateType::new(StateTypeId::new(), "power", false)])
            .event_types(vec![EventType::new(EventTypeId::new(), "overheated")])
            .action_types(vec![ActionType::new(ActionTypeId::new(), "set power")])
            .build()
    }

    #[test]
    fn should_default_to_user_creation_and_just_add_setup() {
        let class = lamp_class();
        assert!(class.supports_create_method(CreateMethod::User));
        assert!(!class.supports_create_method(CreateMethod::Discovery));
        assert_eq!(class.setup_method(), SetupMethod::JustAdd);
    }

    #[test]
    fn should_union_explicit_and_derived_event_types() {
        let class = lamp_class();
        let events = class.event_types();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "overheated");
        assert_eq!(events[1].name, "power changed");
        assert_eq!(events[1].param_types.len(), 1);
        assert_eq!(events[1].param_types[0].name, "value");
    }

    #[test]
    fn should_reuse_state_type_uuid_for_derived_event_type() {
        let class = lamp_class();
        let state_type_id = class.state_types()[0].id;
        assert!(class.has_event_type(state_type_id.as_event_type_id()));
    }

    #[test]
    fn should_not_declare_unknown_event_type() {
        let class = lamp_class();
        assert!(!class.has_event_type(EventTypeId::new()));
    }

    #[test]
    fn should_declare_listed_action_type() {
        let class = lamp_class();
        let action_type_id = class.action_types()[0].id;
        assert!(class.has_action_type(action_type_id));
        assert!(!class.has_action_type(ActionTypeId::new()));
    }

    #[test]
    fn should_roundtrip_device_class_through_serde_json() {
        let class = lamp_class();
        let json = serde_json::to_string(&class).unwrap();
        let parsed: DeviceClass = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, class);
    }

    #[test]
    fn should_generate_fresh_descriptor_ids() {
        let a = DeviceDescriptor::new("Switch 1", "found on bus", Vec::new());
        let b = DeviceDescriptor::new("Switch 2", "found on bus", Vec::new());
        assert_ne!(a.id, b.id);
    }
}
