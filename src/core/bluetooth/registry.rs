//! Collection of peripherals seen during discovery, keyed by identifier.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;

use crate::core::bluetooth::constants::BOND_STATE_UNKNOWN_DEVICE;
use crate::core::bluetooth::types::{Advertisement, ConnectionState, DiscoveredDevice};
use crate::utils::normalize_identifier;

#[derive(Debug, Default)]
struct RegistryInner {
    /// Identifiers in order of first discovery
    order: Vec<String>,
    devices: HashMap<String, DiscoveredDevice>,
}

/// Registry of discovered peripherals.
///
/// Entries are created on first sight and updated in place afterwards;
/// they are only dropped by [`DeviceRegistry::reset`]. Each update replaces
/// the whole record under the write lock, so readers never see a partially
/// updated device.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    inner: RwLock<RegistryInner>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a peripheral or refreshes the record held for it.
    ///
    /// A later report without a name keeps the name already known.
    /// Returns a snapshot of the stored record.
    pub fn upsert(
        &self,
        identifier: &str,
        display_name: &str,
        signal_strength: i16,
        connection_state: ConnectionState,
    ) -> DiscoveredDevice {
        self.upsert_advertisement(&Advertisement::new(
            identifier,
            Some(display_name),
            signal_strength,
            connection_state,
        ))
    }

    /// Same as [`upsert`](Self::upsert), taking a radio report directly.
    pub fn upsert_advertisement(&self, advertisement: &Advertisement) -> DiscoveredDevice {
        let identifier = normalize_identifier(&advertisement.identifier);
        let name = advertisement.name.as_deref().unwrap_or_default();

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = match inner.devices.get(&identifier) {
            Some(existing) => DiscoveredDevice {
                identifier: identifier.clone(),
                display_name: if name.is_empty() {
                    existing.display_name.clone()
                } else {
                    name.to_string()
                },
                signal_strength: advertisement.rssi,
                connection_state: advertisement.connection_state,
                device_type: advertisement.device_type,
            },
            None => {
                debug!("New device discovered: {}", identifier);
                inner.order.push(identifier.clone());
                DiscoveredDevice {
                    identifier: identifier.clone(),
                    display_name: name.to_string(),
                    signal_strength: advertisement.rssi,
                    connection_state: advertisement.connection_state,
                    device_type: advertisement.device_type,
                }
            }
        };
        inner.devices.insert(identifier, record.clone());
        record
    }

    /// Devices currently connected, in order of first discovery.
    pub fn list_connected(&self) -> Vec<DiscoveredDevice> {
        self.list_where(|device| device.connection_state == ConnectionState::Connected)
    }

    /// Every known device, in order of first discovery.
    pub fn list_all(&self) -> Vec<DiscoveredDevice> {
        self.list_where(|_| true)
    }

    fn list_where(&self, predicate: impl Fn(&DiscoveredDevice) -> bool) -> Vec<DiscoveredDevice> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|identifier| inner.devices.get(identifier))
            .filter(|device| predicate(device))
            .cloned()
            .collect()
    }

    /// Bond state code of a device, or 0 when the identifier was never seen.
    pub fn connection_state_of(&self, identifier: &str) -> i32 {
        self.get(identifier)
            .map(|device| device.connection_state.status_code())
            .unwrap_or(BOND_STATE_UNKNOWN_DEVICE)
    }

    pub fn get(&self, identifier: &str) -> Option<DiscoveredDevice> {
        let identifier = normalize_identifier(identifier);
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.devices.get(&identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every device.
    pub fn reset(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = inner.order.len();
        inner.order.clear();
        inner.devices.clear();
        debug!("Device registry reset, {} entries dropped", dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::types::DeviceType;

    #[test]
    fn rediscovery_updates_in_place() {
        let registry = DeviceRegistry::new();
        registry.upsert("AA:BB", "Scale", -60, ConnectionState::Disconnected);
        let updated = registry.upsert("AA:BB", "Scale", -55, ConnectionState::Connected);

        assert_eq!(registry.len(), 1);
        assert_eq!(updated.signal_strength, -55);
        assert_eq!(registry.connection_state_of("AA:BB"), 12);

        let connected = registry.list_connected();
        assert_eq!(connected.len(), 1);
        assert_eq!(connected[0].identifier, "AA:BB");
        assert_eq!(connected[0].signal_strength, -55);
    }

    #[test]
    fn unknown_identifier_is_distinct_from_disconnected() {
        let registry = DeviceRegistry::new();
        registry.upsert("seen", "", -70, ConnectionState::Disconnected);
        assert_eq!(registry.connection_state_of("never-seen"), 0);
        assert_eq!(registry.connection_state_of("seen"), 10);
    }

    #[test]
    fn listing_follows_first_discovery_order() {
        let registry = DeviceRegistry::new();
        registry.upsert("c", "", -40, ConnectionState::Connected);
        registry.upsert("a", "", -40, ConnectionState::Connected);
        registry.upsert("b", "", -40, ConnectionState::Disconnected);
        registry.upsert("c", "", -45, ConnectionState::Connected);
        registry.upsert("b", "", -45, ConnectionState::Connected);

        let order: Vec<_> = registry
            .list_connected()
            .into_iter()
            .map(|device| device.identifier)
            .collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn connected_list_never_exceeds_distinct_identifiers() {
        let registry = DeviceRegistry::new();
        for rssi in -90..-40 {
            registry.upsert("x", "", rssi, ConnectionState::Connected);
            registry.upsert("y", "", rssi, ConnectionState::Disconnected);
        }
        assert_eq!(registry.len(), 2);
        assert!(registry.list_connected().len() <= 2);
        assert_eq!(registry.list_connected().len(), 1);
    }

    #[test]
    fn nameless_report_keeps_known_name() {
        let registry = DeviceRegistry::new();
        registry.upsert("id", "Headset", -50, ConnectionState::Disconnected);
        let device = registry.upsert_advertisement(&Advertisement::new(
            "id",
            None,
            -52,
            ConnectionState::Connecting,
        ));
        assert_eq!(device.display_name, "Headset");
        assert_eq!(device.connection_state, ConnectionState::Connecting);
    }

    #[test]
    fn identifiers_match_after_normalization() {
        let registry = DeviceRegistry::new();
        let advertisement = Advertisement::new("aa-bb-cc-dd-ee-ff", Some("Tag"), -61, ConnectionState::Connected)
            .with_device_type(DeviceType::Classic);
        registry.upsert_advertisement(&advertisement);

        assert_eq!(registry.connection_state_of("AA:BB:CC:DD:EE:FF"), 12);
        assert_eq!(registry.get("aa:bb:cc:dd:ee:ff").unwrap().device_type, DeviceType::Classic);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let registry = DeviceRegistry::new();
        registry.upsert("a", "", -40, ConnectionState::Connected);
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.list_all().is_empty());
        assert_eq!(registry.connection_state_of("a"), 0);
    }
}
