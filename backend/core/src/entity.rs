//! Platform entities that command arguments can resolve to.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches wrapped identifiers such as `<@123>`, `<@!123>`, `<@&123>`, `<#123>` and `<:name:123>`.
static MENTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<[at]?(:[^:]*)?(@[!&]?|#|:)(\d+)(:)?.*>$").unwrap());

/// A platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

impl Snowflake {
    pub fn get(self) -> u64 {
        self.0
    }

    /// Parse a bare run of ASCII digits. Anything else (signs, spaces, mentions) is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Snowflake)
    }
}

impl FromStr for Snowflake {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Snowflake)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Snowflake(value)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the identifier from a mention-style wrapped token.
pub fn parse_mention(raw: &str) -> Option<Snowflake> {
    MENTION_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(3))
        .and_then(|m| Snowflake::parse(m.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<Snowflake>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: None,
            bot: false,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    pub fn bot(mut self) -> Self {
        self.bot = true;
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminator {
            Some(d) => write!(f, "{}#{}", self.username, d),
            None => f.write_str(&self.username),
        }
    }
}

/// A user seen through a particular guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    pub guild_id: Snowflake,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
}

impl Member {
    pub fn new(user: User, guild_id: impl Into<Snowflake>) -> Self {
        Self { user, guild_id: guild_id.into(), nick: None }
    }

    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    pub fn id(&self) -> Snowflake {
        self.user.id
    }

    /// Guild nickname if set, else the username.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.username)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.user.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
}

impl Channel {
    pub fn new(id: impl Into<Snowflake>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), guild_id: None }
    }

    pub fn in_guild(mut self, guild_id: impl Into<Snowflake>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    pub guild_id: Snowflake,
}

impl Role {
    pub fn new(id: impl Into<Snowflake>, name: impl Into<String>, guild_id: impl Into<Snowflake>) -> Self {
        Self { id: id.into(), name: name.into(), guild_id: guild_id.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Member,
    Channel,
    Role,
}

/// Any cached or fetched platform object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    User(User),
    Member(Member),
    Channel(Channel),
    Role(Role),
}

impl Entity {
    pub fn id(&self) -> Snowflake {
        match self {
            Entity::User(u) => u.id,
            Entity::Member(m) => m.id(),
            Entity::Channel(c) => c.id,
            Entity::Role(r) => r.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::User(_) => EntityKind::User,
            Entity::Member(_) => EntityKind::Member,
            Entity::Channel(_) => EntityKind::Channel,
            Entity::Role(_) => EntityKind::Role,
        }
    }

    /// The user behind a user or member entity.
    pub fn as_user(&self) -> Option<&User> {
        match self {
            Entity::User(u) => Some(u),
            Entity::Member(m) => Some(&m.user),
            _ => None,
        }
    }
}
