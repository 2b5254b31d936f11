//! Core functionality for the bridge
//! This module contains the adapter session and everything it owns.

pub mod bluetooth;

// Re-export commonly used types
pub use bluetooth::BluetoothManager;
