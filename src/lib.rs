//! Bluetooth serial bridge library
//! Normalizes platform Bluetooth adapter and device states into the status
//! codes a cross-platform host runtime expects, and exposes them through
//! named commands and two event streams.

// Module declarations
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
#[cfg(feature = "tauri")]
pub mod plugin;
pub mod state;
pub mod utils;

pub use commands::{dispatch, Method};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use state::AppState;
