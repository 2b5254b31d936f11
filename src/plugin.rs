//! Tauri plugin exposing the bridge commands and event streams.

use log::error;
use serde_json::Value;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

use crate::commands;
use crate::config::BridgeConfig;
use crate::core::bluetooth::{RadioDriver, DISCOVERY_CHANNEL, STATE_CHANNEL};
use crate::error::BridgeError;
use crate::state::AppState;

/// Invokes a bridge command by name.
#[tauri::command]
fn invoke(
    method: String,
    arguments: Option<Value>,
    app_state: State<'_, AppState>,
) -> Result<Value, BridgeError> {
    commands::dispatch(&app_state, &method, &arguments.unwrap_or(Value::Null))
}

/// Builds the plugin around `radio`.
///
/// Adapter status codes are emitted on [`STATE_CHANNEL`] and device payloads
/// on [`DISCOVERY_CHANNEL`].
pub fn init<R: Runtime>(radio: Box<dyn RadioDriver>, config: BridgeConfig) -> TauriPlugin<R> {
    Builder::new("bluetooth-serial")
        .invoke_handler(tauri::generate_handler![invoke])
        .setup(move |app, _api| {
            let app_state = AppState::new();
            let manager = app_state.initialize(radio, config);
            forward_events(app.clone(), &manager);
            app.manage(app_state);
            Ok(())
        })
        .build()
}

fn forward_events<R: Runtime>(app: AppHandle<R>, manager: &crate::core::BluetoothManager) {
    let state_app = app.clone();
    manager.events().subscribe_state(move |status| {
        if let Err(e) = state_app.emit(STATE_CHANNEL, status) {
            error!("Failed to emit {} event: {}", STATE_CHANNEL, e);
        }
    });
    manager.events().subscribe_discovery(move |device| {
        if let Err(e) = app.emit(DISCOVERY_CHANNEL, device) {
            error!("Failed to emit {} event: {}", DISCOVERY_CHANNEL, e);
        }
    });
}
