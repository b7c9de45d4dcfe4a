use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Events delivered by the platform connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The connection finished its handshake.
    Ready,
    /// A message was posted somewhere the bot can see.
    MessageCreate(Message),
    /// Any other platform event, passed through untouched.
    Raw {
        name: String,
        payload: serde_json::Value,
    },
}

impl GatewayEvent {
    /// Normalized listener key for this event.
    pub fn name(&self) -> String {
        match self {
            GatewayEvent::Ready => "READY".to_string(),
            GatewayEvent::MessageCreate(_) => "MESSAGE_CREATE".to_string(),
            GatewayEvent::Raw { name, .. } => normalize_event_name(name),
        }
    }
}

/// Uppercase an event name and drop a leading `ON_`, so `on_message_create`,
/// `message_create` and `MESSAGE_CREATE` all key the same listeners.
pub fn normalize_event_name(name: &str) -> String {
    let upper = name.trim().to_uppercase();
    match upper.strip_prefix("ON_") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::User;

    #[test]
    fn test_event_names() {
        assert_eq!(GatewayEvent::Ready.name(), "READY");
        let msg = Message::new(1, 1, User::new(1, "a"), "hi");
        assert_eq!(GatewayEvent::MessageCreate(msg).name(), "MESSAGE_CREATE");
        let raw = GatewayEvent::Raw { name: "guild_create".into(), payload: serde_json::json!({}) };
        assert_eq!(raw.name(), "GUILD_CREATE");
    }

    #[test]
    fn test_normalize_event_name() {
        assert_eq!(normalize_event_name("on_message_create"), "MESSAGE_CREATE");
        assert_eq!(normalize_event_name("command_error"), "COMMAND_ERROR");
        assert_eq!(normalize_event_name("ON_READY"), "READY");
        assert_eq!(normalize_event_name("on_"), "ON_");
    }

    #[test]
    fn test_event_serialization() {
        let event = GatewayEvent::Raw { name: "typing_start".into(), payload: serde_json::json!({"x": 1}) };
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: GatewayEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.name(), "TYPING_START");
    }
}
