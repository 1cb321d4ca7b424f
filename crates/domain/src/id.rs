//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a device plugin.
    PluginId
);

define_id!(
    /// Unique identifier for a [`Vendor`](crate::vendor::Vendor).
    VendorId
);

define_id!(
    /// Unique identifier for a [`DeviceClass`](crate::device_class::DeviceClass).
    DeviceClassId
);

define_id!(
    /// Unique identifier for a configured [`Device`](crate::device::Device).
    DeviceId
);

define_id!(
    /// Unique identifier for a [`StateType`](crate::state::StateType).
    StateTypeId
);

define_id!(
    /// Unique identifier for an [`EventType`](crate::event::EventType).
    EventTypeId
);

define_id!(
    /// Unique identifier for an [`ActionType`](crate::action::ActionType).
    ActionTypeId
);

define_id!(
    /// Correlation identifier for a single [`Action`](crate::action::Action) execution.
    ActionId
);

define_id!(
    /// Unique identifier for a [`Rule`](crate::rule::Rule).
    RuleId
);

define_id!(
    /// Candidate device produced by discovery, before it is configured.
    DeviceDescriptorId
);

define_id!(
    /// Correlation token for a multi-step pairing handshake.
    PairingTransactionId
);

impl StateTypeId {
    /// The event type describing changes of this state.
    ///
    /// Every state type implicitly contributes a "&lt;state&gt; changed" event
    /// type that reuses the state type's UUID, so the two are correlated
    /// without any lookup table.
    #[must_use]
    pub fn as_event_type_id(self) -> EventTypeId {
        EventTypeId::from_uuid(self.0)
    }
}
