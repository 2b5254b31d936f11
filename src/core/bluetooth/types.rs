//! Defines shared data structures for the Bluetooth module.

use serde::Serialize;

use crate::core::bluetooth::status::{map_adapter_state, map_connection_state};

/// Normalized power/availability state of the local adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterState {
    /// The platform has not reported a state yet, or reported one this
    /// crate does not know. Carries the raw platform value.
    Unknown(i32),
    Unsupported,
    Unauthorized,
    Resetting,
    PoweredOff,
    PoweredOn,
}

impl AdapterState {
    /// Decodes a raw platform state using the CoreBluetooth manager-state numbering.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Resetting,
            2 => Self::Unsupported,
            3 => Self::Unauthorized,
            4 => Self::PoweredOff,
            5 => Self::PoweredOn,
            other => Self::Unknown(other),
        }
    }

    /// Cross-platform status code for this state.
    pub fn status_code(self) -> i32 {
        map_adapter_state(self)
    }
}

impl Default for AdapterState {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

/// Link state between the adapter and a remote peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Disconnecting,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Cross-platform status code for this state.
    pub fn status_code(self) -> i32 {
        map_connection_state(self)
    }
}

/// Radio technology reported for a peripheral, using the Android type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    #[default]
    Unknown,
    Classic,
    LowEnergy,
    Dual,
}

impl DeviceType {
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Classic => 1,
            Self::LowEnergy => 2,
            Self::Dual => 3,
        }
    }
}

/// A single advertisement or state report delivered by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Stable platform identifier of the peripheral
    pub identifier: String,
    /// Advertised local name, if the packet carried one
    pub name: Option<String>,
    /// Received signal strength in dBm
    pub rssi: i16,
    pub connection_state: ConnectionState,
    pub device_type: DeviceType,
}

impl Advertisement {
    pub fn new(identifier: impl Into<String>, name: Option<&str>, rssi: i16, connection_state: ConnectionState) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.map(str::to_string),
            rssi,
            connection_state,
            device_type: DeviceType::Unknown,
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }
}

/// A peripheral held by the [`DeviceRegistry`](super::DeviceRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Platform identifier, the registry key
    pub identifier: String,
    /// Display name, empty when the peripheral never advertised one
    pub display_name: String,
    /// Last seen signal strength in dBm
    pub signal_strength: i16,
    pub connection_state: ConnectionState,
    pub device_type: DeviceType,
}

impl DiscoveredDevice {
    /// Converts the record into the shape the host runtime consumes.
    pub fn to_payload(&self) -> DevicePayload {
        DevicePayload {
            name: self.display_name.clone(),
            address: self.identifier.clone(),
            device_type: self.device_type.code(),
            is_connected: self.connection_state == ConnectionState::Connected,
            bond_state: self.connection_state.status_code(),
            rssi: self.signal_strength,
        }
    }
}

/// Device description sent over the discovery stream and returned by
/// `getBondedDevices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePayload {
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub device_type: i32,
    pub is_connected: bool,
    pub bond_state: i32,
    pub rssi: i16,
}

/// Discovery lifecycle of an adapter session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    #[default]
    Idle,
    Discovering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_states_decode_with_passthrough() {
        assert_eq!(AdapterState::from_raw(5), AdapterState::PoweredOn);
        assert_eq!(AdapterState::from_raw(4), AdapterState::PoweredOff);
        assert_eq!(AdapterState::from_raw(0), AdapterState::Unknown(0));
        assert_eq!(AdapterState::from_raw(7), AdapterState::Unknown(7));
        assert_eq!(AdapterState::from_raw(-3), AdapterState::Unknown(-3));
    }

    #[test]
    fn payload_serializes_with_host_field_names() {
        let device = DiscoveredDevice {
            identifier: "AA:BB".to_string(),
            display_name: "Printer".to_string(),
            signal_strength: -55,
            connection_state: ConnectionState::Connected,
            device_type: DeviceType::LowEnergy,
        };
        let json = serde_json::to_value(device.to_payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Printer",
                "address": "AA:BB",
                "type": 2,
                "isConnected": true,
                "bondState": 12,
                "rssi": -55,
            })
        );
    }

    #[test]
    fn disconnected_payload_is_not_connected() {
        let device = DiscoveredDevice {
            identifier: "id".to_string(),
            display_name: String::new(),
            signal_strength: -80,
            connection_state: ConnectionState::Connecting,
            device_type: DeviceType::Unknown,
        };
        let payload = device.to_payload();
        assert!(!payload.is_connected);
        assert_eq!(payload.bond_state, 11);
        assert_eq!(payload.device_type, 0);
    }
}
