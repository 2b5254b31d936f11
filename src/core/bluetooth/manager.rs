//! Bluetooth manager for the bridge
//! This module owns one adapter session: the adapter state, the device
//! registry, the discovery state machine and the event streams.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::{debug, info};

use crate::config::BridgeConfig;
use crate::core::bluetooth::events::{BridgeEvent, EventMultiplexer};
use crate::core::bluetooth::radio::{RadioDelegate, RadioDriver};
use crate::core::bluetooth::registry::DeviceRegistry;
use crate::core::bluetooth::tracker::AdapterStateTracker;
use crate::core::bluetooth::types::{Advertisement, DevicePayload, DiscoveryState};

/// Manages one adapter session
pub struct BluetoothManager {
    /// Platform radio
    radio: Box<dyn RadioDriver>,
    /// Current adapter state
    tracker: AdapterStateTracker,
    /// Devices seen so far
    registry: DeviceRegistry,
    /// Subscribers of the state and discovery streams
    events: EventMultiplexer,
    discovery: Mutex<DiscoveryState>,
    config: BridgeConfig,
}

impl BluetoothManager {
    /// Creates a session and attaches it to the radio as its delegate.
    pub fn new(radio: Box<dyn RadioDriver>, config: BridgeConfig) -> Arc<Self> {
        let manager = Arc::new(Self {
            radio,
            tracker: AdapterStateTracker::new(),
            registry: DeviceRegistry::new(),
            events: EventMultiplexer::new(),
            discovery: Mutex::new(DiscoveryState::Idle),
            config,
        });
        let delegate: Weak<dyn RadioDelegate> = Arc::downgrade(&manager) as Weak<dyn RadioDelegate>;
        manager.radio.attach(delegate);
        info!("Bluetooth session created.");
        manager
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn events(&self) -> &EventMultiplexer {
        &self.events
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn is_available(&self) -> bool {
        self.tracker.is_available()
    }

    pub fn is_on(&self) -> bool {
        self.tracker.is_powered_on()
    }

    pub fn adapter_status(&self) -> i32 {
        self.tracker.current_status()
    }

    pub fn discovery_state(&self) -> DiscoveryState {
        *self.discovery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery_state() == DiscoveryState::Discovering
    }

    /// Moves the discovery state machine, returning false if it was already in `next`.
    fn transition(&self, next: DiscoveryState) -> bool {
        let mut discovery = self.discovery.lock().unwrap_or_else(PoisonError::into_inner);
        if *discovery == next {
            return false;
        }
        *discovery = next;
        true
    }

    /// Starts scanning. Calling it while already discovering does nothing.
    ///
    /// No lock is held while the radio is called, so listeners that run
    /// inline on replayed advertisements may query the session or cancel
    /// the discovery.
    pub fn start_discovery(&self) {
        if !self.transition(DiscoveryState::Discovering) {
            debug!("Discovery already running.");
            return;
        }
        if self.config.reset_registry_on_discovery {
            self.registry.reset();
        }
        info!("Starting discovery.");
        self.radio.start_scan();
        if !self.is_discovering() {
            // Cancelled while the scan was starting; the radio may have begun after the stop.
            self.radio.stop_scan();
        }
    }

    /// Stops scanning. Calling it while idle does nothing.
    pub fn cancel_discovery(&self) {
        if !self.transition(DiscoveryState::Idle) {
            debug!("Discovery not running.");
            return;
        }
        info!("Stopping discovery.");
        self.radio.stop_scan();
    }

    /// Connected devices in order of first discovery.
    pub fn bonded_devices(&self) -> Vec<DevicePayload> {
        self.registry
            .list_connected()
            .iter()
            .map(|device| device.to_payload())
            .collect()
    }

    /// Bond state code of a device, 0 if never seen.
    pub fn device_bond_state(&self, identifier: &str) -> i32 {
        self.registry.connection_state_of(identifier)
    }
}

impl RadioDelegate for BluetoothManager {
    fn on_state_changed(&self, raw_state: i32) {
        let update = self.tracker.on_radio_state_changed(raw_state);
        if update.changed {
            self.events.publish(BridgeEvent::AdapterState(update.status));
        }
        if !self.tracker.is_powered_on() && self.transition(DiscoveryState::Idle) {
            info!("Adapter left the powered-on state, discovery stopped.");
            self.radio.stop_scan();
        }
    }

    fn on_scan_stopped(&self) {
        if self.transition(DiscoveryState::Idle) {
            info!("Radio ended the scan, discovery stopped.");
        }
    }

    fn on_device_discovered(&self, advertisement: Advertisement) {
        let device = self.registry.upsert_advertisement(&advertisement);
        debug!(
            "Device report - ID: {}, Name: {:?}, RSSI: {}, State: {:?}",
            device.identifier, device.display_name, device.signal_strength, device.connection_state
        );
        self.events.publish(BridgeEvent::Discovery(device.to_payload()));
    }
}
