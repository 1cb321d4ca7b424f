//! Notification bus — core-to-API-layer signals over a broadcast channel.

use serde_json::Value;
use tokio::sync::broadcast;

use casahub_domain::device_class::DeviceDescriptor;
use casahub_domain::error::DeviceError;
use casahub_domain::event::Event;
use casahub_domain::id::{
    ActionId, DeviceClassId, DeviceId, PairingTransactionId, RuleId, StateTypeId,
};

/// Everything the core announces to interested outer layers (JSON-RPC,
/// REST, monitoring). Consumers subscribe; the core never waits for them.
#[derive(Debug, Clone)]
pub enum Notification {
    RuleAdded {
        rule_id: RuleId,
    },
    RuleRemoved {
        rule_id: RuleId,
    },
    DeviceSetupFinished {
        device_id: DeviceId,
        result: Result<(), DeviceError>,
    },
    DeviceEditFinished {
        device_id: DeviceId,
        result: Result<(), DeviceError>,
    },
    DeviceRemoved {
        device_id: DeviceId,
    },
    DevicesDiscovered {
        device_class_id: DeviceClassId,
        descriptors: Vec<DeviceDescriptor>,
    },
    PairingFinished {
        transaction_id: PairingTransactionId,
        result: Result<(), DeviceError>,
        device_id: Option<DeviceId>,
    },
    ActionExecuted {
        action_id: ActionId,
        result: Result<(), DeviceError>,
    },
    StateValueChanged {
        device_id: DeviceId,
        state_type_id: StateTypeId,
        value: Value,
    },
    EventTriggered {
        event: Event,
    },
}

/// In-process notification bus backed by a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the notification is simply dropped).
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish a notification to all current subscribers.
    pub fn publish(&self, notification: Notification) {
        // send fails only when there are zero receivers, which is fine.
        let _ = self.sender.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_deliver_notification_to_subscriber() {
        let bus = NotificationBus::new(16);
        let mut rx = bus.subscribe();

        let rule_id = RuleId::new();
        bus.publish(Notification::RuleAdded { rule_id });

        match rx.recv().await.unwrap() {
            Notification::RuleAdded { rule_id: received } => assert_eq!(received, rule_id),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn should_deliver_to_multiple_subscribers() {
        let bus = NotificationBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let device_id = DeviceId::new();
        bus.publish(Notification::DeviceRemoved { device_id });

        assert!(matches!(
            rx1.recv().await.unwrap(),
            Notification::DeviceRemoved { .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            Notification::DeviceRemoved { .. }
        ));
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = NotificationBus::new(16);
        bus.publish(Notification::RuleRemoved {
            rule_id: RuleId::new(),
        });
    }
}
