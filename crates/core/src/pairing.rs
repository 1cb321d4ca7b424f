//! Pairing — the async multi-step flow for discovering and confirming devices.
//!
//! Per device class the flow walks Idle → Discovering → DescriptorsReady;
//! per candidate it walks Pairing → AwaitingConfirmation → resolved. A
//! transaction resolves exactly once: taking it out of the manager consumes
//! it, so a repeated confirm finds nothing.

use std::collections::HashMap;

use casahub_domain::device_class::{DeviceDescriptor, SetupMethod};
use casahub_domain::id::{DeviceClassId, DeviceDescriptorId, PairingTransactionId};
use casahub_domain::param::Param;

/// Discovery progress for one device class.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryState {
    /// No discovery has been requested.
    Idle,
    /// A discovery is running; results have not arrived yet.
    Discovering,
    /// Candidate descriptors are available for pairing.
    DescriptorsReady(Vec<DeviceDescriptor>),
}

/// A pairing handshake held open until the user confirms.
#[derive(Debug, Clone)]
pub struct PairingTransaction {
    pub id: PairingTransactionId,
    pub device_class_id: DeviceClassId,
    pub params: Vec<Param>,
}

/// What the caller needs to walk the user through pairing.
#[derive(Debug, Clone)]
pub struct PairingInfo {
    pub transaction_id: PairingTransactionId,
    pub setup_method: SetupMethod,
    pub pairing_info: String,
}

/// Tracks discovery results and pending pairing transactions.
#[derive(Debug, Default)]
pub struct PairingManager {
    discoveries: HashMap<DeviceClassId, DiscoveryState>,
    pending: HashMap<PairingTransactionId, PairingTransaction>,
}

impl PairingManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovery progress for a class.
    #[must_use]
    pub fn discovery_state(&self, device_class_id: DeviceClassId) -> &DiscoveryState {
        self.discoveries
            .get(&device_class_id)
            .unwrap_or(&DiscoveryState::Idle)
    }

    /// Mark a class as having a discovery in flight.
    pub fn begin_discovery(&mut self, device_class_id: DeviceClassId) {
        self.discoveries
            .insert(device_class_id, DiscoveryState::Discovering);
    }

    /// Deliver discovery results for a class.
    ///
    /// Results for a class nobody is discovering are dropped; the waiter
    /// already gave up or was never registered, which is not an error.
    pub fn complete_discovery(
        &mut self,
        device_class_id: DeviceClassId,
        descriptors: Vec<DeviceDescriptor>,
    ) -> bool {
        match self.discoveries.get(&device_class_id) {
            Some(DiscoveryState::Discovering) => {
                self.discoveries
                    .insert(device_class_id, DiscoveryState::DescriptorsReady(descriptors));
                true
            }
            _ => false,
        }
    }

    /// Look up a discovered candidate by id.
    #[must_use]
    pub fn descriptor(
        &self,
        device_class_id: DeviceClassId,
        descriptor_id: DeviceDescriptorId,
    ) -> Option<&DeviceDescriptor> {
        match self.discoveries.get(&device_class_id) {
            Some(DiscoveryState::DescriptorsReady(descriptors)) => {
                descriptors.iter().find(|d| d.id == descriptor_id)
            }
            _ => None,
        }
    }

    /// Open a transaction and hold it until confirmed.
    pub fn start(&mut self, device_class_id: DeviceClassId, params: Vec<Param>) -> PairingTransactionId {
        let id = PairingTransactionId::new();
        self.pending.insert(
            id,
            PairingTransaction {
                id,
                device_class_id,
                params,
            },
        );
        id
    }

    /// Resolve a transaction, consuming it.
    ///
    /// Returns `None` for an unknown id and for a transaction that already
    /// resolved — both look the same to the caller on purpose.
    #[must_use]
    pub fn take(&mut self, id: PairingTransactionId) -> Option<PairingTransaction> {
        self.pending.remove(&id)
    }

    /// Whether a transaction is still waiting for confirmation.
    #[must_use]
    pub fn is_pending(&self, id: PairingTransactionId) -> bool {
        self.pending.contains_key(&id)
    }
}
