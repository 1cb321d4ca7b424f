//! Vendor — the manufacturer a device class belongs to.

use serde::{Deserialize, Serialize};

use crate::id::VendorId;

/// A device manufacturer, contributed to the registry by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
}

impl Vendor {
    /// Create a new vendor.
    #[must_use]
    pub fn new(id: VendorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_vendor_through_serde_json() {
        let vendor = Vendor::new(VendorId::new(), "Casahub Virtual");
        let json = serde_json::to_string(&vendor).unwrap();
        let parsed: Vendor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vendor);
    }
}
