use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use log::{error, info};
use regex::Regex;
use tokio::fs;
use uuid::Uuid;

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$").expect("valid MAC address pattern")
});

/// Asynchronously ensures that a directory exists, creating it if it does not.
/// This function is idempotent.
pub async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        if let Err(e) = fs::create_dir_all(path).await {
            error!("Failed to create directory at {:?}: {}", path, e);
            return Err(e.into());
        }
        info!("Created directory at: {:?}", path);
    }
    Ok(())
}

/// Brings a peripheral identifier into canonical form.
///
/// MAC addresses become upper-case and colon separated, UUIDs become
/// upper-case hyphenated. Anything else is opaque and returned verbatim.
pub fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    if MAC_ADDRESS.is_match(trimmed) {
        return trimmed.replace('-', ":").to_uppercase();
    }
    match Uuid::parse_str(trimmed) {
        Ok(uuid) => uuid.hyphenated().to_string().to_uppercase(),
        Err(_) => identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_addresses_are_canonicalized() {
        assert_eq!(normalize_identifier("aa:bb:cc:dd:ee:ff"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize_identifier("aa-bb-cc-dd-ee-0f"), "AA:BB:CC:DD:EE:0F");
    }

    #[test]
    fn uuids_are_canonicalized() {
        assert_eq!(
            normalize_identifier("6e400001-b5a3-f393-e0a9-e50e24dcca9e"),
            "6E400001-B5A3-F393-E0A9-E50E24DCCA9E"
        );
        assert_eq!(
            normalize_identifier("6E400001B5A3F393E0A9E50E24DCCA9E"),
            "6E400001-B5A3-F393-E0A9-E50E24DCCA9E"
        );
    }

    #[test]
    fn opaque_identifiers_are_kept() {
        assert_eq!(normalize_identifier("AA:BB"), "AA:BB");
        assert_eq!(normalize_identifier("hci0/dev_11"), "hci0/dev_11");
        assert_eq!(normalize_identifier(""), "");
    }

    #[tokio::test]
    async fn creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        ensure_directory_exists(&nested).await.unwrap();
    }
}
