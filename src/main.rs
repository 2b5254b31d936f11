//! Stdio host for the bridge.
//!
//! Reads one JSON request per line from stdin, `{"method": "...", "arguments": ...}`,
//! and answers with `{"result": ...}` or `{"error": {...}}`. Adapter-state and
//! discovery events are written as `{"event": "<channel>", "data": ...}`.
//!
//! Usage: `bluetooth-serial-bridge [config.json]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};

use bluetooth_serial_bridge_lib::config::bridge_config::CONFIG_FILE_NAME;
use bluetooth_serial_bridge_lib::core::bluetooth::{BridgeEvent, Channel, RadioDriver, METHOD_CHANNEL};
use bluetooth_serial_bridge_lib::{commands, logging, AppState, BridgeConfig};

#[derive(Debug, Deserialize)]
struct Request {
    method: String,
    #[serde(default)]
    arguments: Value,
}

type Stdout = Arc<Mutex<tokio::io::Stdout>>;

async fn write_line(stdout: &Stdout, value: &Value) -> Result<()> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    let mut stdout = stdout.lock().await;
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}

#[cfg(feature = "bluest")]
async fn open_radio() -> Result<Box<dyn RadioDriver>> {
    let radio = bluetooth_serial_bridge_lib::core::bluetooth::BluestRadio::new().await?;
    Ok(Box::new(radio))
}

#[cfg(not(feature = "bluest"))]
async fn open_radio() -> Result<Box<dyn RadioDriver>> {
    log::warn!("Built without a platform radio, using the simulated adapter.");
    Ok(Box::new(
        bluetooth_serial_bridge_lib::core::bluetooth::SimulatedRadio::new().with_state(5),
    ))
}

fn forward_events(stdout: Stdout, mut events: mpsc::UnboundedReceiver<BridgeEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let message = match &event {
                BridgeEvent::AdapterState(status) => json!({ "event": event.channel().name(), "data": status }),
                BridgeEvent::Discovery(device) => json!({ "event": event.channel().name(), "data": device }),
            };
            if let Err(e) = write_line(&stdout, &message).await {
                error!("Failed to write event: {}", e);
                break;
            }
        }
    });
}

fn respond(app_state: &AppState, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            return json!({ "error": { "code": "bad_request", "message": e.to_string(), "retryable": false } });
        }
    };
    match commands::dispatch(app_state, &request.method, &request.arguments) {
        Ok(result) => json!({ "result": result }),
        Err(e) => json!({ "error": e }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = BridgeConfig::load_config(&config_path).await?;
    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let stdout: Stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let app_state = AppState::new();
    let radio = open_radio().await?;
    let manager = app_state.initialize(radio, config);

    let (_state_handle, state_events) = manager.events().subscribe_channel(Channel::AdapterState);
    let (_discovery_handle, discovery_events) = manager.events().subscribe_channel(Channel::Discovery);
    forward_events(stdout.clone(), state_events);
    forward_events(stdout.clone(), discovery_events);

    info!("Serving {} on stdio.", METHOD_CHANNEL);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = respond(&app_state, line);
        write_line(&stdout, &response).await?;
    }

    manager.cancel_discovery();
    info!("Stdin closed, shutting down.");
    Ok(())
}
