//! Application state management
//! This module holds the adapter session the command layer talks to.

use std::sync::{Arc, OnceLock};

use log::{info, warn};

use crate::config::BridgeConfig;
use crate::core::bluetooth::RadioDriver;
use crate::core::BluetoothManager;
use crate::error::{BridgeError, Result};

/// Host-side state: the adapter session, once one has been created.
#[derive(Default)]
pub struct AppState {
    bluetooth_manager: OnceLock<Arc<BluetoothManager>>,
}

impl AppState {
    /// Creates a state with no session; commands fail with `NotInitialized`
    /// until [`AppState::initialize`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the adapter session on top of `radio`.
    ///
    /// Only the first call takes effect; later calls return the existing session.
    pub fn initialize(&self, radio: Box<dyn RadioDriver>, config: BridgeConfig) -> Arc<BluetoothManager> {
        if let Some(manager) = self.bluetooth_manager.get() {
            warn!("Bluetooth session already initialized, keeping the existing one.");
            return manager.clone();
        }
        info!("Initializing BluetoothManager...");
        self.bluetooth_manager
            .get_or_init(|| BluetoothManager::new(radio, config))
            .clone()
    }

    /// Gets the adapter session
    pub fn bluetooth_manager(&self) -> Result<Arc<BluetoothManager>> {
        self.bluetooth_manager
            .get()
            .cloned()
            .ok_or(BridgeError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.bluetooth_manager.get().is_some()
    }
}
