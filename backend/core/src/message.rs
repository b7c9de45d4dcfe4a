use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Channel, Entity, Snowflake, User};

/// An inbound chat message as delivered by the platform connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    pub author: User,
    pub content: String,
    /// Users and members mentioned in the message, used as a converter fast path.
    #[serde(default)]
    pub mentions: Vec<Entity>,
    /// The channel the message was posted in, when the platform resolved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: impl Into<Snowflake>,
        channel_id: impl Into<Snowflake>,
        author: User,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            content: content.into(),
            mentions: Vec::new(),
            channel: None,
            timestamp: Utc::now(),
        }
    }

    pub fn in_guild(mut self, guild_id: impl Into<Snowflake>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_mention(mut self, entity: Entity) -> Self {
        self.mentions.push(entity);
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = Message::new(1, 2, User::new(3, "alice"), "!ping")
            .in_guild(4)
            .with_mention(Entity::User(User::new(5, "bob")));
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "!ping");
        assert_eq!(deserialized.guild_id, Some(Snowflake(4)));
        assert_eq!(deserialized.mentions.len(), 1);
    }
}
