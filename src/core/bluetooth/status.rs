//! Translation tables from platform states to the shared status codes.
//!
//! Codes are chosen to match Android's `BluetoothAdapter` and
//! `BluetoothDevice` constants as closely as the platform allows, so the
//! host runtime can treat both platforms alike.

use crate::core::bluetooth::constants::{
    ADAPTER_STATUS_OFF, ADAPTER_STATUS_ON, ADAPTER_STATUS_UNUSABLE, BOND_STATE_BONDED,
    BOND_STATE_BONDING, BOND_STATE_NONE,
};
use crate::core::bluetooth::types::{AdapterState, ConnectionState};

/// Maps an adapter state to its status code.
///
/// Unknown states pass their raw platform value through unchanged so that
/// states introduced by future platform releases still yield a defined code.
pub fn map_adapter_state(state: AdapterState) -> i32 {
    match state {
        AdapterState::Unknown(raw) => raw,
        AdapterState::Unsupported | AdapterState::Unauthorized | AdapterState::Resetting => {
            ADAPTER_STATUS_UNUSABLE
        }
        AdapterState::PoweredOff => ADAPTER_STATUS_OFF,
        AdapterState::PoweredOn => ADAPTER_STATUS_ON,
    }
}

/// Maps a peripheral connection state to its bond state code.
pub fn map_connection_state(state: ConnectionState) -> i32 {
    match state {
        ConnectionState::Disconnected | ConnectionState::Disconnecting => BOND_STATE_NONE,
        ConnectionState::Connecting => BOND_STATE_BONDING,
        ConnectionState::Connected => BOND_STATE_BONDED,
    }
}
