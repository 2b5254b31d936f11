//! Errors returned to command callers.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Failure of a bridge command.
///
/// Every variant is a deterministic function of the command and the
/// platform; none of them is a transient I/O condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The command name is not part of the bridge surface.
    #[error("unknown method '{0}' called")]
    UnknownCommand(String),

    /// The command exists but this platform cannot perform it.
    #[error("'{command}' is not supported on this platform: {reason}")]
    CapabilityUnsupported { command: String, reason: String },

    /// The command arrived before an adapter session was attached.
    #[error("bluetooth session is not initialized")]
    NotInitialized,
}

impl BridgeError {
    pub fn unsupported(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CapabilityUnsupported {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::CapabilityUnsupported { .. } => "unsupported",
            Self::NotInitialized => "not_initialized",
        }
    }

    /// Only a missing session can resolve itself; the rest are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }
}

impl Serialize for BridgeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut error = serializer.serialize_struct("BridgeError", 3)?;
        error.serialize_field("code", self.code())?;
        error.serialize_field("message", &self.to_string())?;
        error.serialize_field("retryable", &self.is_retryable())?;
        error.end()
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_codes() {
        let err = BridgeError::UnknownCommand("fly".to_string());
        assert_eq!(err.to_string(), "unknown method 'fly' called");
        assert_eq!(err.code(), "unknown_command");
        assert!(!err.is_retryable());

        let err = BridgeError::unsupported("setName", "device name is read-only");
        assert_eq!(
            err.to_string(),
            "'setName' is not supported on this platform: device name is read-only"
        );
        assert_eq!(err.code(), "unsupported");
        assert!(!err.is_retryable());

        assert!(BridgeError::NotInitialized.is_retryable());
    }

    #[test]
    fn serializes_for_transport() {
        let json = serde_json::to_value(BridgeError::NotInitialized).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": "not_initialized",
                "message": "bluetooth session is not initialized",
                "retryable": true,
            })
        );
    }
}
