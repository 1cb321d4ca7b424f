//! The reactor — single-threaded coordinator for events, rules, and plugins.
//!
//! One [`Core`] instance owns every mutable piece of the hub: registry,
//! device store, rule engine, pairing manager, hardware arbiter, and the
//! plugins themselves. Inbound work (plugin events, timer ticks, async
//! completions) arrives on one channel and is processed strictly one message
//! at a time, so no locking discipline is needed anywhere in the core.
//!
//! Suspension only ever happens at plugin-call boundaries declared
//! asynchronous: the plugin returns an `Async` status together with a
//! correlation key and the reactor moves on; the completion comes back as a
//! [`CoreMessage`] keyed by the same id. Completions nobody waits for are
//! dropped with a debug log.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use casahub_domain::action::Action;
use casahub_domain::device::Device;
use casahub_domain::device_class::{CreateMethod, DeviceClass, DeviceDescriptor, SetupMethod};
use casahub_domain::error::{DeviceError, RuleError};
use casahub_domain::event::Event;
use casahub_domain::id::{
    ActionId, DeviceClassId, DeviceDescriptorId, DeviceId, PairingTransactionId, PluginId, RuleId,
    StateTypeId,
};
use casahub_domain::param::Param;
use casahub_domain::rule::Rule;

use crate::device_store::{self, DeviceStore};
use crate::hardware::{HardwareArbiter, HardwareResource, RadioInjector, DEFAULT_TIMER_INTERVAL};
use crate::notify::{Notification, NotificationBus};
use crate::pairing::{PairingInfo, PairingManager};
use crate::ports::plugin::{DevicePlugin, ExecuteStatus, PluginHandle, SetupStatus};
use crate::ports::storage::{DeviceRepository, RuleRepository};
use crate::registry::CapabilityRegistry;
use crate::rule_engine::RuleEngine;

/// Inbound work for the reactor.
#[derive(Debug)]
pub enum CoreMessage {
    /// A plugin emitted an event.
    EventEmitted(Event),
    /// A plugin requests a device state update.
    SetStateValue {
        device_id: DeviceId,
        state_type_id: StateTypeId,
        value: Value,
    },
    /// Discovery results arrived for a device class.
    DevicesDiscovered {
        device_class_id: DeviceClassId,
        descriptors: Vec<DeviceDescriptor>,
    },
    /// An asynchronous device setup or edit completed.
    DeviceSetupFinished {
        device_id: DeviceId,
        result: Result<(), DeviceError>,
    },
    /// An asynchronous pairing confirmation completed.
    PairingFinished {
        transaction_id: PairingTransactionId,
        result: Result<(), DeviceError>,
    },
    /// An asynchronous action execution completed.
    ActionFinished {
        action_id: ActionId,
        result: Result<(), DeviceError>,
    },
    /// The shared plugin timer ticked.
    TimerTick,
    /// A radio receiver picked up raw timing samples.
    RadioData {
        resource: HardwareResource,
        samples: Vec<i32>,
    },
    /// Stop the reactor loop.
    Shutdown,
}

/// Parameters for creating or editing a device: supplied directly, or pulled
/// from a previously discovered candidate.
#[derive(Debug, Clone)]
pub enum DeviceParams {
    List(Vec<Param>),
    FromDescriptor(DeviceDescriptorId),
}

/// Outcome of a device add or edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The device is set up and stored.
    Done(DeviceId),
    /// Setup continues in the background; completion arrives as a
    /// notification keyed by the device id.
    Async(DeviceId),
}

/// Outcome of a pairing confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Pairing finished and the device is stored.
    Paired(DeviceId),
    /// The plugin finishes in the background; completion arrives as a
    /// notification keyed by the transaction id.
    Async,
}

/// Outcome of an action execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action finished synchronously.
    Done(ActionId),
    /// Execution continues in the background; completion arrives as a
    /// notification keyed by the action id.
    Async(ActionId),
}

/// Tunables for the core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Interval of the shared plugin timer.
    pub timer_interval: Duration,
    /// Capacity of the notification broadcast channel.
    pub notification_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timer_interval: DEFAULT_TIMER_INTERVAL,
            notification_capacity: 256,
        }
    }
}

/// The hub core: every component, one owner, one message queue.
pub struct Core<DR, RR> {
    registry: CapabilityRegistry,
    devices: DeviceStore<DR>,
    rules: RuleEngine<RR>,
    pairing: PairingManager,
    arbiter: HardwareArbiter,
    notifications: NotificationBus,
    plugins: IndexMap<PluginId, Box<dyn DevicePlugin>>,
    pending_setups: HashMap<DeviceId, Device>,
    pending_edits: HashMap<DeviceId, Vec<Param>>,
    pending_pairings: HashMap<PairingTransactionId, Device>,
    /// Devices whose post-pairing setup is still in flight, mapped back to
    /// their transaction so the completion surfaces as a pairing result.
    pairing_setups: HashMap<DeviceId, PairingTransactionId>,
    pending_actions: HashSet<ActionId>,
    sender: mpsc::UnboundedSender<CoreMessage>,
    receiver: mpsc::UnboundedReceiver<CoreMessage>,
}

impl<DR: DeviceRepository, RR: RuleRepository> Core<DR, RR> {
    /// Create a core with empty registry and stores.
    pub fn new(device_repo: DR, rule_repo: RR, config: CoreConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            registry: CapabilityRegistry::new(),
            devices: DeviceStore::new(device_repo),
            rules: RuleEngine::new(rule_repo),
            pairing: PairingManager::new(),
            arbiter: HardwareArbiter::new(sender.clone(), config.timer_interval),
            notifications: NotificationBus::new(config.notification_capacity),
            plugins: IndexMap::new(),
            pending_setups: HashMap::new(),
            pending_edits: HashMap::new(),
            pending_pairings: HashMap::new(),
            pairing_setups: HashMap::new(),
            pending_actions: HashSet::new(),
            sender,
            receiver,
        }
    }

    /// A handle plugins and transports use to reach the reactor.
    #[must_use]
    pub fn plugin_handle(&self) -> PluginHandle {
        PluginHandle::new(self.sender.clone())
    }

    /// A raw sender for the reactor queue (e.g. to deliver `Shutdown`).
    #[must_use]
    pub fn message_sender(&self) -> mpsc::UnboundedSender<CoreMessage> {
        self.sender.clone()
    }

    /// Subscribe to core notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// The capability registry.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The device store.
    #[must_use]
    pub fn devices(&self) -> &DeviceStore<DR> {
        &self.devices
    }

    /// The rule engine.
    #[must_use]
    pub fn rules(&self) -> &RuleEngine<RR> {
        &self.rules
    }

    /// The injector for a radio resource, once some plugin demanded it.
    #[must_use]
    pub fn radio_injector(&self, resource: HardwareResource) -> Option<RadioInjector> {
        self.arbiter.radio_injector(resource)
    }

    /// Whether the shared plugin timer is running.
    #[must_use]
    pub fn timer_active(&self) -> bool {
        self.arbiter.timer_active()
    }

    /// Register a plugin: merge its capabilities into the registry and hand
    /// it its handle.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DuplicateDeviceClass`] on a class id collision;
    /// nothing of the plugin is registered in that case.
    pub fn register_plugin(&mut self, mut plugin: Box<dyn DevicePlugin>) -> Result<(), DeviceError> {
        self.registry.register_plugin(
            plugin.plugin_id(),
            plugin.supported_vendors(),
            plugin.supported_device_classes(),
        )?;
        plugin.init(self.plugin_handle());
        info!(plugin = plugin.plugin_name(), "loaded plugin");
        self.plugins.insert(plugin.plugin_id(), plugin);
        Ok(())
    }

    /// Load persisted devices and rules, re-running plugin setup for each
    /// restored device.
    ///
    /// Restored devices stay in the store even when their setup fails, so a
    /// flaky device survives a hub restart; the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Storage`] when either repository fails.
    pub async fn load(&mut self) -> Result<(), DeviceError> {
        self.devices.load(&self.registry).await?;
        let restored: Vec<Device> = self.devices.devices().cloned().collect();
        for device in restored {
            let Some(plugin) = self.plugins.get_mut(&device.plugin_id) else {
                warn!(device = %device.id, "no plugin for restored device");
                continue;
            };
            let hardware = plugin.required_hardware();
            self.arbiter.ensure(&hardware);
            if let Err(error) = plugin.setup_device(&device) {
                warn!(device = %device.id, %error, "setup of restored device failed");
            }
        }
        self.rules.load().await.map_err(|e| match e {
            RuleError::Storage(message) => DeviceError::Storage(message),
            other => DeviceError::Storage(other.to_string()),
        })
    }

    /// Create a device the user configured by hand.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceClassNotFound`],
    /// [`DeviceError::CreationMethodNotSupported`],
    /// [`DeviceError::MissingParameter`], [`DeviceError::PluginNotFound`],
    /// or the plugin's setup error. Nothing is stored on failure.
    pub async fn add_configured_device(
        &mut self,
        device_class_id: DeviceClassId,
        params: Vec<Param>,
    ) -> Result<SetupOutcome, DeviceError> {
        let class = self
            .registry
            .find_device_class(device_class_id)
            .cloned()
            .ok_or(DeviceError::DeviceClassNotFound(device_class_id))?;
        if !class.supports_create_method(CreateMethod::User) {
            return Err(DeviceError::CreationMethodNotSupported);
        }
        device_store::validate_params(class.param_types(), &params)?;
        let mut device = Device::new(
            DeviceId::new(),
            device_class_id,
            class.plugin_id(),
            class.name(),
            params,
        );
        device_store::init_states(&mut device, &class);
        self.setup_and_store(device).await
    }

    async fn setup_and_store(&mut self, device: Device) -> Result<SetupOutcome, DeviceError> {
        let plugin = self
            .plugins
            .get_mut(&device.plugin_id)
            .ok_or(DeviceError::PluginNotFound(device.plugin_id))?;
        let hardware = plugin.required_hardware();
        self.arbiter.ensure(&hardware);
        match plugin.setup_device(&device)? {
            SetupStatus::Done => {
                let device_id = device.id;
                self.devices.insert(device).await?;
                Ok(SetupOutcome::Done(device_id))
            }
            SetupStatus::Async => {
                let device_id = device.id;
                self.pending_setups.insert(device_id, device);
                Ok(SetupOutcome::Async(device_id))
            }
        }
    }

    /// Re-validate parameters and re-run plugin setup for an existing
    /// device, keeping its id.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`add_configured_device`](Self::add_configured_device),
    /// plus [`DeviceError::DeviceNotFound`] and
    /// [`DeviceError::DeviceDescriptorNotFound`].
    pub async fn edit_device(
        &mut self,
        device_id: DeviceId,
        params: DeviceParams,
    ) -> Result<SetupOutcome, DeviceError> {
        let device = self
            .devices
            .find(device_id)
            .cloned()
            .ok_or(DeviceError::DeviceNotFound(device_id))?;
        let class = self
            .registry
            .find_device_class(device.device_class_id)
            .cloned()
            .ok_or(DeviceError::DeviceClassNotFound(device.device_class_id))?;
        let params = self.resolve_params(&class, params)?;
        device_store::validate_params(class.param_types(), &params)?;

        let mut updated = device;
        updated.params.clone_from(&params);
        let plugin = self
            .plugins
            .get_mut(&updated.plugin_id)
            .ok_or(DeviceError::PluginNotFound(updated.plugin_id))?;
        match plugin.setup_device(&updated)? {
            SetupStatus::Done => {
                self.devices.set_params(device_id, params).await?;
                self.notifications.publish(Notification::DeviceEditFinished {
                    device_id,
                    result: Ok(()),
                });
                Ok(SetupOutcome::Done(device_id))
            }
            SetupStatus::Async => {
                self.pending_edits.insert(device_id, params);
                Ok(SetupOutcome::Async(device_id))
            }
        }
    }

    /// Remove a device and report which rules referenced it.
    ///
    /// Rules are never deleted here; the caller decides whether to remove
    /// them or repair them via
    /// [`remove_device_from_rule`](Self::remove_device_from_rule).
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`] or [`DeviceError::Storage`].
    pub async fn remove_configured_device(
        &mut self,
        device_id: DeviceId,
    ) -> Result<Vec<RuleId>, DeviceError> {
        let device = self.devices.remove(device_id).await?;
        if let Some(plugin) = self.plugins.get_mut(&device.plugin_id) {
            plugin.device_removed(&device);
        }
        let affected = self.rules.find_rules(device_id);
        self.notifications
            .publish(Notification::DeviceRemoved { device_id });
        Ok(affected)
    }

    /// Start discovery of candidate devices for a class.
    ///
    /// Discovery is always asynchronous: `Ok` means the plugin accepted the
    /// request, and results arrive later as a
    /// [`Notification::DevicesDiscovered`] correlated by device class id.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::CreationMethodNotSupported`] when the class
    /// cannot be discovered, plus the class/param/plugin resolution errors.
    pub fn discover_devices(
        &mut self,
        device_class_id: DeviceClassId,
        params: Vec<Param>,
    ) -> Result<(), DeviceError> {
        let class = self
            .registry
            .find_device_class(device_class_id)
            .cloned()
            .ok_or(DeviceError::DeviceClassNotFound(device_class_id))?;
        if !class.supports_create_method(CreateMethod::Discovery) {
            return Err(DeviceError::CreationMethodNotSupported);
        }
        device_store::validate_params(class.discovery_param_types(), &params)?;
        let plugin = self
            .plugins
            .get_mut(&class.plugin_id())
            .ok_or(DeviceError::PluginNotFound(class.plugin_id()))?;
        plugin.discover_devices(device_class_id, &params)?;
        self.pairing.begin_discovery(device_class_id);
        Ok(())
    }

    /// Open a pairing transaction and return the instructions to display.
    ///
    /// The transaction stays pending until
    /// [`confirm_pairing`](Self::confirm_pairing) resolves it; there is no
    /// timeout in the core.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::CreationMethodNotSupported`] for `JustAdd`
    /// classes (configure those via
    /// [`add_configured_device`](Self::add_configured_device)), plus the
    /// class/param resolution errors.
    pub fn pair_device(
        &mut self,
        device_class_id: DeviceClassId,
        params: DeviceParams,
    ) -> Result<PairingInfo, DeviceError> {
        let class = self
            .registry
            .find_device_class(device_class_id)
            .cloned()
            .ok_or(DeviceError::DeviceClassNotFound(device_class_id))?;
        if class.setup_method() == SetupMethod::JustAdd {
            return Err(DeviceError::CreationMethodNotSupported);
        }
        let params = self.resolve_params(&class, params)?;
        device_store::validate_params(class.param_types(), &params)?;
        let transaction_id = self.pairing.start(device_class_id, params);
        Ok(PairingInfo {
            transaction_id,
            setup_method: class.setup_method(),
            pairing_info: class.pairing_info().to_string(),
        })
    }

    /// Resolve a held pairing transaction with the user-provided secret.
    ///
    /// The transaction is consumed no matter the outcome; confirming twice
    /// yields [`DeviceError::TransactionNotFound`].
    ///
    /// # Errors
    ///
    /// [`DeviceError::TransactionNotFound`] for unknown or already resolved
    /// transactions; otherwise whatever the plugin reports, surfaced both as
    /// the return value and a [`Notification::PairingFinished`].
    pub async fn confirm_pairing(
        &mut self,
        transaction_id: PairingTransactionId,
        secret: &str,
    ) -> Result<ConfirmOutcome, DeviceError> {
        let transaction = self
            .pairing
            .take(transaction_id)
            .ok_or(DeviceError::TransactionNotFound(transaction_id))?;
        let class = self
            .registry
            .find_device_class(transaction.device_class_id)
            .cloned()
            .ok_or(DeviceError::DeviceClassNotFound(transaction.device_class_id))?;
        let plugin = self
            .plugins
            .get_mut(&class.plugin_id())
            .ok_or(DeviceError::PluginNotFound(class.plugin_id()))?;
        let hardware = plugin.required_hardware();

        let mut device = Device::new(
            DeviceId::new(),
            class.id(),
            class.plugin_id(),
            class.name(),
            transaction.params,
        );
        device_store::init_states(&mut device, &class);

        match plugin.confirm_pairing(transaction_id, class.id(), secret) {
            Err(error) => {
                self.notifications.publish(Notification::PairingFinished {
                    transaction_id,
                    result: Err(error.clone()),
                    device_id: None,
                });
                Err(error)
            }
            Ok(SetupStatus::Done) => {
                self.arbiter.ensure(&hardware);
                self.complete_pairing(transaction_id, device).await
            }
            Ok(SetupStatus::Async) => {
                self.arbiter.ensure(&hardware);
                self.pending_pairings.insert(transaction_id, device);
                Ok(ConfirmOutcome::Async)
            }
        }
    }

    /// Run device setup for a confirmed pairing and store the device.
    ///
    /// Pairing only counts as finished once setup finished too; a plugin
    /// setting up asynchronously here completes through the same
    /// device-setup channel as any other setup, and the reactor maps that
    /// completion back to the pairing transaction.
    async fn complete_pairing(
        &mut self,
        transaction_id: PairingTransactionId,
        device: Device,
    ) -> Result<ConfirmOutcome, DeviceError> {
        let device_id = device.id;
        let Some(plugin) = self.plugins.get_mut(&device.plugin_id) else {
            let error = DeviceError::PluginNotFound(device.plugin_id);
            self.notifications.publish(Notification::PairingFinished {
                transaction_id,
                result: Err(error.clone()),
                device_id: None,
            });
            return Err(error);
        };
        match plugin.setup_device(&device) {
            Err(error) => {
                self.notifications.publish(Notification::PairingFinished {
                    transaction_id,
                    result: Err(error.clone()),
                    device_id: None,
                });
                Err(error)
            }
            Ok(SetupStatus::Done) => match self.devices.insert(device).await {
                Ok(()) => {
                    self.notifications.publish(Notification::PairingFinished {
                        transaction_id,
                        result: Ok(()),
                        device_id: Some(device_id),
                    });
                    Ok(ConfirmOutcome::Paired(device_id))
                }
                Err(error) => {
                    self.notifications.publish(Notification::PairingFinished {
                        transaction_id,
                        result: Err(error.clone()),
                        device_id: None,
                    });
                    Err(error)
                }
            },
            Ok(SetupStatus::Async) => {
                self.pending_setups.insert(device_id, device);
                self.pairing_setups.insert(device_id, transaction_id);
                Ok(ConfirmOutcome::Async)
            }
        }
    }

    /// Update a device state; the state-changed notification and the
    /// synthesized event are processed before this call returns, so no rule
    /// ever evaluates against a stale state.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`] or
    /// [`DeviceError::StateTypeNotFound`].
    pub async fn set_state_value(
        &mut self,
        device_id: DeviceId,
        state_type_id: StateTypeId,
        value: Value,
    ) -> Result<(), DeviceError> {
        let event = self
            .devices
            .set_state_value(device_id, state_type_id, value.clone())?;
        self.notifications.publish(Notification::StateValueChanged {
            device_id,
            state_type_id,
            value,
        });
        self.handle_event(event).await;
        Ok(())
    }

    /// Execute an action on a device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceNotFound`],
    /// [`DeviceError::DeviceClassNotFound`],
    /// [`DeviceError::ActionTypeNotFound`],
    /// [`DeviceError::PluginNotFound`], or the plugin's execution error.
    pub async fn execute_action(&mut self, action: Action) -> Result<ActionOutcome, DeviceError> {
        let device = self
            .devices
            .find(action.device_id)
            .cloned()
            .ok_or(DeviceError::DeviceNotFound(action.device_id))?;
        let class = self
            .registry
            .find_device_class(device.device_class_id)
            .ok_or(DeviceError::DeviceClassNotFound(device.device_class_id))?;
        if !class.has_action_type(action.action_type_id) {
            return Err(DeviceError::ActionTypeNotFound(action.action_type_id));
        }
        let plugin = self
            .plugins
            .get_mut(&device.plugin_id)
            .ok_or(DeviceError::PluginNotFound(device.plugin_id))?;
        match plugin.execute_action(&device, &action)? {
            ExecuteStatus::Done => {
                self.notifications.publish(Notification::ActionExecuted {
                    action_id: action.id,
                    result: Ok(()),
                });
                Ok(ActionOutcome::Done(action.id))
            }
            ExecuteStatus::Async => {
                self.pending_actions.insert(action.id);
                Ok(ActionOutcome::Async(action.id))
            }
        }
    }

    /// Validate and append a rule.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::add_rule`]; nothing is stored on failure.
    pub async fn add_rule(&mut self, rule: Rule) -> Result<(), RuleError> {
        let rule_id = rule.id;
        let devices = &self.devices;
        let registry = &self.registry;
        let class_of = move |id: DeviceId| {
            devices
                .find(id)
                .and_then(|d| registry.find_device_class(d.device_class_id))
                .cloned()
        };
        self.rules.add_rule(rule, class_of).await?;
        self.notifications
            .publish(Notification::RuleAdded { rule_id });
        Ok(())
    }

    /// Remove a rule.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::remove_rule`].
    pub async fn remove_rule(&mut self, rule_id: RuleId) -> Result<(), RuleError> {
        self.rules.remove_rule(rule_id).await?;
        self.notifications
            .publish(Notification::RuleRemoved { rule_id });
        Ok(())
    }

    /// Strip a removed device's references out of one rule.
    ///
    /// # Errors
    ///
    /// See [`RuleEngine::remove_device_from_rule`].
    pub async fn remove_device_from_rule(
        &mut self,
        rule_id: RuleId,
        device_id: DeviceId,
    ) -> Result<(), RuleError> {
        self.rules.remove_device_from_rule(rule_id, device_id).await
    }

    /// Process one inbound message.
    pub async fn handle_message(&mut self, message: CoreMessage) {
        match message {
            CoreMessage::EventEmitted(event) => self.handle_event(event).await,
            CoreMessage::SetStateValue {
                device_id,
                state_type_id,
                value,
            } => {
                if let Err(error) = self.set_state_value(device_id, state_type_id, value).await {
                    warn!(device = %device_id, %error, "plugin state update rejected");
                }
            }
            CoreMessage::DevicesDiscovered {
                device_class_id,
                descriptors,
            } => {
                if self.pairing.complete_discovery(device_class_id, descriptors.clone()) {
                    self.notifications.publish(Notification::DevicesDiscovered {
                        device_class_id,
                        descriptors,
                    });
                } else {
                    debug!(class = %device_class_id, "dropping discovery results nobody waits for");
                }
            }
            CoreMessage::DeviceSetupFinished { device_id, result } => {
                self.finish_setup(device_id, result).await;
            }
            CoreMessage::PairingFinished {
                transaction_id,
                result,
            } => self.finish_pairing(transaction_id, result).await,
            CoreMessage::ActionFinished { action_id, result } => {
                if self.pending_actions.remove(&action_id) {
                    self.notifications
                        .publish(Notification::ActionExecuted { action_id, result });
                } else {
                    debug!(action = %action_id, "dropping completion for unknown action");
                }
            }
            CoreMessage::TimerTick => self.dispatch_timer_tick(),
            CoreMessage::RadioData { resource, samples } => {
                self.dispatch_radio_data(resource, &samples);
            }
            CoreMessage::Shutdown => {}
        }
    }

    /// Consume the reactor queue until shutdown, strictly in arrival order.
    pub async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            if matches!(message, CoreMessage::Shutdown) {
                break;
            }
            self.handle_message(message).await;
        }
        self.arbiter.shutdown();
        info!("reactor stopped");
    }

    /// Drain everything currently queued, then return.
    pub async fn process_queued(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            self.handle_message(message).await;
        }
    }

    async fn handle_event(&mut self, event: Event) {
        self.notifications.publish(Notification::EventTriggered {
            event: event.clone(),
        });
        // Full rule scan first; dispatch strictly afterwards.
        let actions = {
            let devices = &self.devices;
            self.rules
                .evaluate_event(&event, &|device_id, state_type_id| {
                    devices.state_value(device_id, state_type_id)
                })
        };
        debug!(event = %event, count = actions.len(), "dispatching matched actions");
        for action in actions {
            let action_id = action.id;
            if let Err(error) = self.execute_action(action).await {
                warn!(action = %action_id, %error, "rule action failed");
                self.notifications.publish(Notification::ActionExecuted {
                    action_id,
                    result: Err(error),
                });
            }
        }
    }

    async fn finish_setup(&mut self, device_id: DeviceId, result: Result<(), DeviceError>) {
        if let Some(device) = self.pending_setups.remove(&device_id) {
            let result = match result {
                Ok(()) => self.devices.insert(device).await,
                Err(error) => Err(error),
            };
            if let Some(transaction_id) = self.pairing_setups.remove(&device_id) {
                let stored = result.is_ok();
                self.notifications.publish(Notification::PairingFinished {
                    transaction_id,
                    result,
                    device_id: stored.then_some(device_id),
                });
            } else {
                self.notifications
                    .publish(Notification::DeviceSetupFinished { device_id, result });
            }
        } else if let Some(params) = self.pending_edits.remove(&device_id) {
            let result = match result {
                Ok(()) => self.devices.set_params(device_id, params).await,
                Err(error) => Err(error),
            };
            self.notifications
                .publish(Notification::DeviceEditFinished { device_id, result });
        } else {
            debug!(device = %device_id, "dropping setup completion nobody waits for");
        }
    }

    async fn finish_pairing(
        &mut self,
        transaction_id: PairingTransactionId,
        result: Result<(), DeviceError>,
    ) {
        let Some(device) = self.pending_pairings.remove(&transaction_id) else {
            debug!(transaction = %transaction_id, "dropping pairing completion nobody waits for");
            return;
        };
        match result {
            // complete_pairing publishes the final notification either way.
            Ok(()) => {
                let _ = self.complete_pairing(transaction_id, device).await;
            }
            Err(error) => {
                self.notifications.publish(Notification::PairingFinished {
                    transaction_id,
                    result: Err(error),
                    device_id: None,
                });
            }
        }
    }

    fn dispatch_timer_tick(&mut self) {
        for plugin in self.plugins.values_mut() {
            if plugin.required_hardware().contains(&HardwareResource::Timer) {
                plugin.timer_tick();
            }
        }
    }

    fn dispatch_radio_data(&mut self, resource: HardwareResource, samples: &[i32]) {
        for plugin in self.plugins.values_mut() {
            if plugin.required_hardware().contains(&resource) {
                plugin.radio_data(samples);
            }
        }
    }

    fn resolve_params(
        &self,
        class: &DeviceClass,
        params: DeviceParams,
    ) -> Result<Vec<Param>, DeviceError> {
        match params {
            DeviceParams::List(params) => Ok(params),
            DeviceParams::FromDescriptor(descriptor_id) => self
                .pairing
                .descriptor(class.id(), descriptor_id)
                .map(|d| d.params.clone())
                .ok_or(DeviceError::DeviceDescriptorNotFound(descriptor_id)),
        }
    }
}
