use std::fmt;
use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Env};
use log::{Record, SetLoggerError};
use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct LogMessage {
    level: String,
    target: String,
    message: String,
    timestamp: String,
}

impl LogMessage {
    pub fn from_record(record: &Record) -> Self {
        Self {
            level: record.level().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp: Local::now().to_rfc3339(),
        }
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {}", self.timestamp, self.level, self.target, self.message)
    }
}

/// Installs the process logger.
///
/// `default_filter` applies unless `RUST_LOG` is set. Output goes to stderr
/// so that stdout stays free for host traffic.
pub fn init(default_filter: &str) -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "{}", LogMessage::from_record(record)))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn message_captures_record() {
        let message = LogMessage::from_record(
            &Record::builder()
                .level(Level::Warn)
                .target("bridge")
                .args(format_args!("adapter {}", "reset"))
                .build(),
        );
        let line = message.to_string();
        assert!(line.ends_with("[WARN] bridge: adapter reset"), "{line}");
        assert!(chrono::DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
    }

    #[test]
    fn second_init_fails_cleanly() {
        let _ = init("debug");
        assert!(init("debug").is_err());
    }
}
