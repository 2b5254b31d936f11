use std::path::Path;

use crate::utils::ensure_directory_exists;
use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub const CONFIG_FILE_NAME: &str = "bluetooth_bridge_config.json";

/// Settings of an adapter session and its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Clear the device registry every time a discovery session starts.
    /// Off by default so bonded-device queries keep devices seen earlier.
    pub reset_registry_on_discovery: bool,

    /// Local adapter name reported by `getName`
    pub adapter_name: Option<String>,

    /// Local adapter address reported by `getAddress`.
    /// iOS never exposes the radio's MAC, hosts usually supply a vendor UUID.
    pub adapter_address: Option<String>,

    /// Default log filter, `RUST_LOG` takes precedence
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            reset_registry_on_discovery: false,
            adapter_name: None,
            adapter_address: None,
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Loads the config from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub async fn load_config(file_path: &Path) -> Result<Self> {
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!(
                "Config file not found at {:?}, using default.",
                file_path_str
            );
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the config as pretty-printed JSON, creating the parent directory.
    pub async fn save_config(&self, file_path: &Path) -> Result<()> {
        if let Some(config_dir) = file_path.parent() {
            ensure_directory_exists(config_dir).await?;
        }
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize bridge config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;

        info!("Bridge config saved to {:?}.", file_path_str);
        Ok(())
    }
}
