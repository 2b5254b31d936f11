//! Bluetooth functionality for the bridge
//! This module normalizes adapter and device states reported by the platform
//! radio and fans them out to the host's event streams.

mod constants;
mod events;
mod manager;
mod radio;
mod registry;
#[cfg(feature = "bluest")]
mod scanner;
mod status;
mod tracker;
mod types;

// Re-export types that should be publicly accessible
pub use constants::*; // Re-export all constants
pub use events::{BridgeEvent, Channel, EventMultiplexer, SubscriptionHandle};
pub use manager::BluetoothManager;
pub use radio::{RadioDelegate, RadioDriver, SimulatedRadio};
pub use registry::DeviceRegistry;
#[cfg(feature = "bluest")]
pub use scanner::BluestRadio;
pub use status::{map_adapter_state, map_connection_state};
pub use tracker::{AdapterStateTracker, StateUpdate};
pub use types::{
    AdapterState, Advertisement, ConnectionState, DevicePayload, DeviceType, DiscoveredDevice,
    DiscoveryState,
};
