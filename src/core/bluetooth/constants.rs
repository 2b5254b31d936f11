//! Constants used throughout the bridge
//! This module contains the fixed status codes and channel names shared
//! between the core and the host adapters.

/// Adapter status code for states that make the radio unusable
/// (unsupported, unauthorized, resetting).
pub const ADAPTER_STATUS_UNUSABLE: i32 = 0;

/// Adapter status code for a powered-off radio (Android `STATE_OFF`)
pub const ADAPTER_STATUS_OFF: i32 = 10;

/// Adapter status code for a powered-on radio (Android `STATE_ON`)
pub const ADAPTER_STATUS_ON: i32 = 12;

/// Bond state code for a disconnected or disconnecting peripheral (Android `BOND_NONE`)
pub const BOND_STATE_NONE: i32 = 10;

/// Bond state code for a peripheral that is connecting (Android `BOND_BONDING`)
pub const BOND_STATE_BONDING: i32 = 11;

/// Bond state code for a connected peripheral (Android `BOND_BONDED`)
pub const BOND_STATE_BONDED: i32 = 12;

/// Returned for identifiers the registry has never seen.
pub const BOND_STATE_UNKNOWN_DEVICE: i32 = 0;

/// Channel carrying command calls
pub const METHOD_CHANNEL: &str = "flutter_bluetooth_serial/methods";

/// Channel carrying adapter status codes
pub const STATE_CHANNEL: &str = "flutter_bluetooth_serial/state";

/// Channel carrying discovered device payloads
pub const DISCOVERY_CHANNEL: &str = "flutter_bluetooth_serial/discovery";
