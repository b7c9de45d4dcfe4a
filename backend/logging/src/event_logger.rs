//! Command Event Logger
//!
//! One structured record per dispatched command, emitted under the
//! `command_events` target so it can be filtered or routed separately.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Completed,
    /// Failed, but an error hook handled it.
    Handled { error: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandEventEntry {
    pub command: String,
    pub author_id: u64,
    pub channel_id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: CommandEvent,
}

impl CommandEventEntry {
    pub fn new(command: impl Into<String>, author_id: u64, channel_id: u64, event: CommandEvent) -> Self {
        Self {
            command: command.into(),
            author_id,
            channel_id,
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Serialize the entry and hand it to tracing.
    pub fn log_event(entry: &CommandEventEntry) {
        let record = serde_json::to_string(entry).unwrap_or_else(|e| format!("{{\"serialize_error\":\"{e}\"}}"));
        match entry.event {
            CommandEvent::Failed { .. } => warn!(target: "command_events", command = %entry.command, record = %record, "Command event"),
            _ => info!(target: "command_events", command = %entry.command, record = %record, "Command event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_flat() {
        let entry = CommandEventEntry::new("ban", 1, 2, CommandEvent::Failed { error: "nope".into() });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "failed");
        assert_eq!(value["command"], "ban");
        assert_eq!(value["error"], "nope");
        assert_eq!(value["author_id"], 1);
    }

    #[test]
    fn completed_has_no_error_field() {
        let entry = CommandEventEntry::new("ping", 1, 2, CommandEvent::Completed);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "completed");
        assert!(value.get("error").is_none());
        EventLogger::log_event(&entry);
    }
}
