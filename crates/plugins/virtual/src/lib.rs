//! # casahub-plugin-virtual
//!
//! A plugin with no hardware behind it: a switch that can be configured
//! directly and a button that must be discovered and paired. Useful for
//! demos and for exercising every seam of the plugin port — synchronous and
//! asynchronous setup, discovery, pairing, action execution, and the shared
//! timer.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use casahub_core::hardware::HardwareResource;
use casahub_core::ports::plugin::{DevicePlugin, ExecuteStatus, PluginHandle, SetupStatus};
use casahub_domain::action::{Action, ActionType};
use casahub_domain::device::Device;
use casahub_domain::device_class::{CreateMethod, DeviceClass, DeviceDescriptor, SetupMethod};
use casahub_domain::error::DeviceError;
use casahub_domain::event::{Event, EventType};
use casahub_domain::id::{
    ActionTypeId, DeviceClassId, DeviceId, EventTypeId, PairingTransactionId, PluginId,
    StateTypeId, VendorId,
};
use casahub_domain::param::{Param, ParamType};
use casahub_domain::state::StateType;
use casahub_domain::vendor::Vendor;

/// Ticks of the shared timer between simulated button presses.
const TICKS_PER_PRESS: u32 = 4;

// Hardcoded capability UUIDs; changing one makes it a new capability to the
// rest of the system.
#[must_use]
pub fn plugin_id() -> PluginId {
    PluginId::from_uuid(Uuid::from_u128(0x7b1d_3f60_9c41_4e8a_b2d5_1a6e_0f24_c703))
}

#[must_use]
pub fn vendor_id() -> VendorId {
    VendorId::from_uuid(Uuid::from_u128(0x2e95_7c18_54aa_4b0f_9d33_c871_65e0_412b))
}

#[must_use]
pub fn switch_class_id() -> DeviceClassId {
    DeviceClassId::from_uuid(Uuid::from_u128(0x48c1_a2de_6b7f_42d3_8e09_55b4_d1f8_9a60))
}

#[must_use]
pub fn switch_power_state_id() -> StateTypeId {
    StateTypeId::from_uuid(Uuid::from_u128(0x91f4_08bb_3dca_47c2_a561_7e92_40d8_ee15))
}

#[must_use]
pub fn switch_set_power_action_id() -> ActionTypeId {
    ActionTypeId::from_uuid(Uuid::from_u128(0x0ab3_66e1_28d9_40b5_bc74_92f0_1c5a_d447))
}

#[must_use]
pub fn button_class_id() -> DeviceClassId {
    DeviceClassId::from_uuid(Uuid::from_u128(0xc50e_914a_77f2_4d86_b1e8_03ad_629c_5b78))
}

#[must_use]
pub fn button_pressed_event_id() -> EventTypeId {
    EventTypeId::from_uuid(Uuid::from_u128(0x6d82_bf05_e913_4f67_8a20_c4d7_3150_9ab2))
}

fn switch_class() -> DeviceClass {
    DeviceClass::builder(switch_class_id(), vendor_id(), plugin_id())
        .name("Virtual Switch")
        .param_types(vec![ParamType::with_default("label", "Virtual Switch")])
        .state_types(vec![StateType::new(
            switch_power_state_id(),
            "power",
            false,
        )])
        .action_types(vec![ActionType::with_params(
            switch_set_power_action_id(),
            "set power",
            vec![ParamType::new("power")],
        )])
        .build()
}

fn button_class() -> DeviceClass {
    DeviceClass::builder(button_class_id(), vendor_id(), plugin_id())
        .name("Virtual Button")
        .create_methods([CreateMethod::Discovery])
        .setup_method(SetupMethod::PushButton)
        .pairing_info("Press the virtual button: confirm the pairing within 30 seconds.")
        .discovery_param_types(vec![ParamType::with_default("count", 2)])
        .param_types(vec![ParamType::new("number")])
        .event_types(vec![EventType::new(button_pressed_event_id(), "pressed")])
        .build()
}

/// The virtual device plugin.
#[derive(Default)]
pub struct VirtualPlugin {
    handle: Option<PluginHandle>,
    buttons: Vec<DeviceId>,
    ticks: u32,
}

impl VirtualPlugin {
    /// Create the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self) -> &PluginHandle {
        self.handle
            .as_ref()
            .expect("plugin used before init; the core always initializes first")
    }
}

impl DevicePlugin for VirtualPlugin {
    fn plugin_id(&self) -> PluginId {
        plugin_id()
    }

    fn plugin_name(&self) -> &str {
        "virtual"
    }

    fn supported_vendors(&self) -> Vec<Vendor> {
        vec![Vendor::new(vendor_id(), "Casahub Virtual")]
    }

    fn supported_device_classes(&self) -> Vec<DeviceClass> {
        vec![switch_class(), button_class()]
    }

    fn required_hardware(&self) -> HashSet<HardwareResource> {
        // The shared timer drives simulated button presses.
        HashSet::from([HardwareResource::Timer])
    }

    fn init(&mut self, handle: PluginHandle) {
        self.handle = Some(handle);
    }

    fn setup_device(&mut self, device: &Device) -> Result<SetupStatus, DeviceError> {
        if device.device_class_id == button_class_id() {
            self.buttons.push(device.id);
        }
        debug!(device = %device, "virtual device ready");
        Ok(SetupStatus::Done)
    }

    fn device_removed(&mut self, device: &Device) {
        self.buttons.retain(|id| *id != device.id);
    }

    fn discover_devices(
        &mut self,
        device_class_id: DeviceClassId,
        params: &[Param],
    ) -> Result<(), DeviceError> {
        if device_class_id != button_class_id() {
            return Err(DeviceError::CreationMethodNotSupported);
        }
        let count = casahub_domain::param::value_of(params, "count")
            .and_then(Value::as_u64)
            .unwrap_or(2);
        let descriptors: Vec<DeviceDescriptor> = (1..=count)
            .map(|number| {
                DeviceDescriptor::new(
                    format!("Virtual Button {number}"),
                    "simulated push button",
                    vec![Param::new("number", number)],
                )
            })
            .collect();
        // Results are queued before this returns; "async" means the caller
        // correlates them by device class id, not that they are slow.
        self.handle().devices_discovered(device_class_id, descriptors);
        Ok(())
    }

    fn confirm_pairing(
        &mut self,
        _transaction_id: PairingTransactionId,
        device_class_id: DeviceClassId,
        _secret: &str,
    ) -> Result<SetupStatus, DeviceError> {
        // Push-button pairing: the press is simulated, any secret confirms.
        if device_class_id == button_class_id() {
            Ok(SetupStatus::Done)
        } else {
            Err(DeviceError::SetupFailed)
        }
    }

    fn execute_action(
        &mut self,
        device: &Device,
        action: &Action,
    ) -> Result<ExecuteStatus, DeviceError> {
        if action.action_type_id != switch_set_power_action_id() {
            return Err(DeviceError::ActionTypeNotFound(action.action_type_id));
        }
        let power = action
            .param("power")
            .and_then(Value::as_bool)
            .ok_or_else(|| DeviceError::MissingParameter("power".to_string()))?;
        self.handle()
            .set_state_value(device.id, switch_power_state_id(), Value::Bool(power));
        Ok(ExecuteStatus::Done)
    }

    fn timer_tick(&mut self) {
        self.ticks += 1;
        if self.ticks % TICKS_PER_PRESS != 0 {
            return;
        }
        for device_id in &self.buttons {
            self.handle().emit_event(Event::new(
                button_pressed_event_id(),
                *device_id,
                Vec::new(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use casahub_adapter_storage_json::JsonStorage;
    use casahub_core::notify::Notification;
    use casahub_core::reactor::{
        ConfirmOutcome, Core, CoreConfig, CoreMessage, DeviceParams, SetupOutcome,
    };
    use casahub_domain::descriptor::{EventDescriptor, ParamDescriptor, ValueOperator};
    use casahub_domain::id::RuleId;
    use casahub_domain::rule::Rule;
    use casahub_domain::state_evaluator::StateEvaluator;

    async fn core_with_plugin(dir: &std::path::Path) -> Core<JsonStorage, JsonStorage> {
        let storage = JsonStorage::new(dir);
        let mut core = Core::new(storage.clone(), storage, CoreConfig::default());
        core.register_plugin(Box::new(VirtualPlugin::new())).unwrap();
        core.load().await.unwrap();
        core
    }

    async fn add_switch(core: &mut Core<JsonStorage, JsonStorage>) -> DeviceId {
        let outcome = core
            .add_configured_device(switch_class_id(), vec![Param::new("label", "demo")])
            .await
            .unwrap();
        match outcome {
            SetupOutcome::Done(device_id) => device_id,
            SetupOutcome::Async(_) => panic!("virtual switch sets up synchronously"),
        }
    }

    #[tokio::test]
    async fn should_register_both_device_classes() {
        let dir = tempfile::tempdir().unwrap();
        let core = core_with_plugin(dir.path()).await;
        assert!(core.registry().find_device_class(switch_class_id()).is_some());
        assert!(core.registry().find_device_class(button_class_id()).is_some());
        assert_eq!(core.registry().vendors().count(), 1);
    }

    #[tokio::test]
    async fn should_flip_switch_state_through_set_power_action() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_with_plugin(dir.path()).await;
        let device_id = add_switch(&mut core).await;

        core.execute_action(Action::new(
            switch_set_power_action_id(),
            device_id,
            vec![Param::new("power", true)],
        ))
        .await
        .unwrap();
        core.process_queued().await;

        assert_eq!(
            core.devices()
                .state_value(device_id, switch_power_state_id()),
            Some(Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn should_fire_rule_from_switch_state_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_with_plugin(dir.path()).await;
        let watched = add_switch(&mut core).await;
        let target = add_switch(&mut core).await;

        // When the watched switch turns on, turn the target on too.
        core.add_rule(Rule::new(
            RuleId::new(),
            vec![EventDescriptor::new(
                switch_power_state_id().as_event_type_id(),
                watched,
                vec![ParamDescriptor::new("value", true, ValueOperator::Equals)],
            )],
            StateEvaluator::Always,
            vec![Action::new(
                switch_set_power_action_id(),
                target,
                vec![Param::new("power", true)],
            )],
        ))
        .await
        .unwrap();

        core.execute_action(Action::new(
            switch_set_power_action_id(),
            watched,
            vec![Param::new("power", true)],
        ))
        .await
        .unwrap();
        core.process_queued().await;
        core.process_queued().await;

        assert_eq!(
            core.devices().state_value(target, switch_power_state_id()),
            Some(Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn should_discover_pair_and_confirm_button() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_with_plugin(dir.path()).await;
        let mut notifications = core.subscribe();

        core.discover_devices(button_class_id(), vec![Param::new("count", 2)])
            .unwrap();
        core.process_queued().await;

        let descriptor_id = loop {
            match notifications.try_recv() {
                Ok(Notification::DevicesDiscovered { descriptors, .. }) => {
                    assert_eq!(descriptors.len(), 2);
                    break descriptors[0].id;
                }
                Ok(_) => {}
                Err(_) => panic!("expected discovery notification"),
            }
        };

        let info = core
            .pair_device(button_class_id(), DeviceParams::FromDescriptor(descriptor_id))
            .unwrap();
        assert_eq!(info.setup_method, SetupMethod::PushButton);
        assert!(info.pairing_info.contains("Press the virtual button"));

        let outcome = core
            .confirm_pairing(info.transaction_id, "")
            .await
            .unwrap();
        let ConfirmOutcome::Paired(device_id) = outcome else {
            panic!("virtual button pairs synchronously");
        };
        let device = core.devices().find(device_id).unwrap();
        assert_eq!(device.name, "Virtual Button");
        assert_eq!(device.param("number"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn should_emit_pressed_events_from_timer_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let mut core = core_with_plugin(dir.path()).await;

        core.discover_devices(button_class_id(), vec![Param::new("count", 1)])
            .unwrap();
        core.process_queued().await;
        let info = core
            .pair_device(button_class_id(), DeviceParams::List(vec![Param::new("number", 1)]))
            .unwrap();
        let ConfirmOutcome::Paired(button) =
            core.confirm_pairing(info.transaction_id, "").await.unwrap()
        else {
            panic!("virtual button pairs synchronously");
        };
        assert!(core.timer_active());

        let mut notifications = core.subscribe();
        for _ in 0..TICKS_PER_PRESS {
            core.handle_message(CoreMessage::TimerTick).await;
        }
        core.process_queued().await;

        let pressed = std::iter::from_fn(|| notifications.try_recv().ok()).any(|n| {
            matches!(
                n,
                Notification::EventTriggered { event }
                    if event.event_type_id == button_pressed_event_id()
                        && event.device_id == button
            )
        });
        assert!(pressed);
    }
}
