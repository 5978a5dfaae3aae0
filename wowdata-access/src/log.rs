use crate::config::LoggingConfig;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// One buffered access log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub message: String,
}

/// Process-wide diagnostic trail of lookups.
///
/// Disabled logs record nothing. Direct logs hand every message to
/// `tracing` immediately; buffered logs keep them for [`AccessLog::entries`].
#[derive(Debug, Default)]
pub struct AccessLog {
    config: LoggingConfig,
    entries: Mutex<Vec<LogEntry>>,
}

impl AccessLog {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn log(&self, message: impl Into<String>) {
        if !self.config.enabled {
            return;
        }
        let message = message.into();
        if self.config.direct {
            info!(target: "wowdata::access", "{message}");
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogEntry {
                time: Utc::now(),
                message,
            });
    }

    /// Buffered entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
