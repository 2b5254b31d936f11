//! Holds the current adapter state reported by the radio.

use std::sync::{PoisonError, RwLock};

use log::info;

use crate::core::bluetooth::types::AdapterState;

/// Result of feeding a raw state report into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    /// Normalized status code of the new state
    pub status: i32,
    /// Whether the state differs from the one held before
    pub changed: bool,
}

/// Tracks the adapter's power/availability state.
///
/// Written only from the radio callback path; reads may come from any thread.
#[derive(Debug, Default)]
pub struct AdapterStateTracker {
    state: RwLock<AdapterState>,
}

impl AdapterStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a raw state from the radio and returns its status code.
    pub fn on_radio_state_changed(&self, raw_state: i32) -> StateUpdate {
        let next = AdapterState::from_raw(raw_state);
        let previous = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, next)
        };
        if previous != next {
            info!("Adapter state changed: {:?} -> {:?}", previous, next);
        }
        StateUpdate {
            status: next.status_code(),
            changed: previous != next,
        }
    }

    pub fn state(&self) -> AdapterState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_status(&self) -> i32 {
        self.state().status_code()
    }

    /// False while the platform reports no usable radio or has not reported yet.
    pub fn is_available(&self) -> bool {
        !matches!(self.state(), AdapterState::Unsupported | AdapterState::Unknown(_))
    }

    pub fn is_powered_on(&self) -> bool {
        self.state() == AdapterState::PoweredOn
    }
}
