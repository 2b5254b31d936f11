//! The boundary to the platform's Bluetooth stack.
//!
//! A [`RadioDriver`] exposes the scan primitives and reports back through a
//! [`RadioDelegate`], one callback at a time.

use std::sync::{Mutex, PoisonError, Weak};

use log::{debug, warn};

use crate::core::bluetooth::types::Advertisement;

/// Callbacks delivered by the radio. Implemented by the session owner.
pub trait RadioDelegate: Send + Sync {
    /// The adapter reported a new raw manager state.
    fn on_state_changed(&self, raw_state: i32);

    /// A peripheral was seen, or its state changed.
    fn on_device_discovered(&self, advertisement: Advertisement);

    /// The radio stopped scanning on its own, without a `stop_scan` call.
    fn on_scan_stopped(&self);
}

/// Scan primitives of the platform radio.
///
/// Calls return immediately; results arrive later through the delegate.
pub trait RadioDriver: Send + Sync {
    /// Gives the driver the delegate it reports to. Drivers may report the
    /// current adapter state from within this call.
    fn attach(&self, delegate: Weak<dyn RadioDelegate>);

    fn start_scan(&self);

    fn stop_scan(&self);
}

#[derive(Default)]
struct SimulatedState {
    delegate: Option<Weak<dyn RadioDelegate>>,
    raw_state: Option<i32>,
    advertisements: Vec<Advertisement>,
    scanning: bool,
    scans_started: usize,
}

/// In-process radio with scripted behaviour.
///
/// Seeded advertisements are replayed on every scan start, and state changes
/// or extra advertisements can be injected at any time.
#[derive(Default)]
pub struct SimulatedRadio {
    state: Mutex<SimulatedState>,
}

impl SimulatedRadio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw state reported once a delegate is attached.
    pub fn with_state(self, raw_state: i32) -> Self {
        self.lock().raw_state = Some(raw_state);
        self
    }

    /// Advertisement replayed whenever a scan starts.
    pub fn with_advertisement(self, advertisement: Advertisement) -> Self {
        self.lock().advertisements.push(advertisement);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delegate(&self) -> Option<std::sync::Arc<dyn RadioDelegate>> {
        let delegate = self.lock().delegate.as_ref().and_then(Weak::upgrade);
        if delegate.is_none() {
            warn!("Simulated radio has no live delegate");
        }
        delegate
    }

    /// Reports a new raw adapter state to the delegate.
    pub fn set_state(&self, raw_state: i32) {
        self.lock().raw_state = Some(raw_state);
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(raw_state);
        }
    }

    /// Reports a single advertisement, as if it had just been received.
    pub fn advertise(&self, advertisement: Advertisement) {
        if let Some(delegate) = self.delegate() {
            delegate.on_device_discovered(advertisement);
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    /// Ends a running scan from the radio side, as when the platform gives up scanning.
    pub fn end_scan(&self) {
        let was_scanning = std::mem::replace(&mut self.lock().scanning, false);
        if !was_scanning {
            return;
        }
        if let Some(delegate) = self.delegate() {
            delegate.on_scan_stopped();
        }
    }

    /// Number of times the scan primitive was started.
    pub fn scans_started(&self) -> usize {
        self.lock().scans_started
    }
}

impl RadioDriver for SimulatedRadio {
    fn attach(&self, delegate: Weak<dyn RadioDelegate>) {
        let raw_state = {
            let mut state = self.lock();
            state.delegate = Some(delegate);
            state.raw_state
        };
        if let Some(raw_state) = raw_state {
            if let Some(delegate) = self.delegate() {
                delegate.on_state_changed(raw_state);
            }
        }
    }

    fn start_scan(&self) {
        let advertisements = {
            let mut state = self.lock();
            state.scanning = true;
            state.scans_started += 1;
            state.advertisements.clone()
        };
        debug!("Simulated scan started, replaying {} advertisements", advertisements.len());
        if let Some(delegate) = self.delegate() {
            for advertisement in advertisements {
                if !self.is_scanning() {
                    debug!("Simulated scan stopped during replay");
                    break;
                }
                delegate.on_device_discovered(advertisement);
            }
        }
    }

    fn stop_scan(&self) {
        self.lock().scanning = false;
        debug!("Simulated scan stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::types::ConnectionState;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<i32>>,
        devices: Mutex<Vec<String>>,
        scans_ended: Mutex<usize>,
    }

    impl RadioDelegate for Recorder {
        fn on_state_changed(&self, raw_state: i32) {
            self.states.lock().unwrap().push(raw_state);
        }

        fn on_device_discovered(&self, advertisement: Advertisement) {
            self.devices.lock().unwrap().push(advertisement.identifier);
        }

        fn on_scan_stopped(&self) {
            *self.scans_ended.lock().unwrap() += 1;
        }
    }

    #[test]
    fn seeded_state_is_reported_on_attach() {
        let radio = SimulatedRadio::new().with_state(5);
        let recorder = Arc::new(Recorder::default());
        let delegate: Arc<dyn RadioDelegate> = recorder.clone();
        radio.attach(Arc::downgrade(&delegate));
        assert_eq!(*recorder.states.lock().unwrap(), vec![5]);
    }

    #[test]
    fn scan_replays_seeded_advertisements() {
        let radio = SimulatedRadio::new()
            .with_advertisement(Advertisement::new("a", Some("A"), -40, ConnectionState::Connected))
            .with_advertisement(Advertisement::new("b", None, -80, ConnectionState::Disconnected));
        let recorder = Arc::new(Recorder::default());
        let delegate: Arc<dyn RadioDelegate> = recorder.clone();
        radio.attach(Arc::downgrade(&delegate));

        radio.start_scan();
        assert!(radio.is_scanning());
        assert_eq!(*recorder.devices.lock().unwrap(), vec!["a", "b"]);

        radio.stop_scan();
        assert!(!radio.is_scanning());
        assert_eq!(radio.scans_started(), 1);
    }

    #[test]
    fn ending_scan_notifies_delegate_once() {
        let radio = SimulatedRadio::new();
        let recorder = Arc::new(Recorder::default());
        let delegate: Arc<dyn RadioDelegate> = recorder.clone();
        radio.attach(Arc::downgrade(&delegate));

        radio.end_scan();
        assert_eq!(*recorder.scans_ended.lock().unwrap(), 0);

        radio.start_scan();
        radio.end_scan();
        radio.end_scan();
        assert!(!radio.is_scanning());
        assert_eq!(*recorder.scans_ended.lock().unwrap(), 1);
    }

    #[test]
    fn dropped_delegate_is_tolerated() {
        let radio = SimulatedRadio::new();
        {
            let delegate: Arc<dyn RadioDelegate> = Arc::new(Recorder::default());
            radio.attach(Arc::downgrade(&delegate));
        }
        radio.set_state(4);
        radio.advertise(Advertisement::new("a", None, -40, ConnectionState::Connected));
        radio.start_scan();
        radio.end_scan();
    }
}
