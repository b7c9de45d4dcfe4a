//! Console channel: stdin lines become messages, replies go to stdout.

use anyhow::Result;
use async_trait::async_trait;
use parley_core::{
    CacheScope, Channel, Entity, GatewayEvent, InMemoryEntityCache, Member, Message, ReplySink, Role, Snowflake,
    User,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

pub const CONSOLE_USER_ID: u64 = 1;
pub const CONSOLE_CHANNEL_ID: u64 = 100;
pub const CONSOLE_GUILD_ID: u64 = 200;

const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false)
}

pub fn console_user() -> User {
    User::new(CONSOLE_USER_ID, "console")
}

pub fn console_channel() -> Channel {
    Channel::new(CONSOLE_CHANNEL_ID, "console").in_guild(CONSOLE_GUILD_ID)
}

/// Wrap one typed line as a guild message from the console user.
pub fn to_message(id: u64, line: &str) -> Message {
    Message::new(id, CONSOLE_CHANNEL_ID, console_user(), line)
        .in_guild(CONSOLE_GUILD_ID)
        .with_channel(console_channel())
}

/// A few entities so the user, member, channel and role converters have
/// something to find.
pub async fn seeded_cache() -> InMemoryEntityCache {
    let cache = InMemoryEntityCache::new();
    let guild = CacheScope::Guild(Snowflake(CONSOLE_GUILD_ID));
    let alice = User::new(10, "alice");
    let bob = User::new(11, "bob").with_discriminator("0042");

    for user in [console_user(), alice.clone(), bob.clone()] {
        cache.insert(CacheScope::Global, Entity::User(user)).await;
    }
    cache.insert(guild, Entity::Member(Member::new(alice, CONSOLE_GUILD_ID).with_nick("Al"))).await;
    cache.insert(guild, Entity::Member(Member::new(bob, CONSOLE_GUILD_ID))).await;
    cache.insert(CacheScope::Global, Entity::Channel(console_channel())).await;
    cache.insert(CacheScope::Global, Entity::Channel(Channel::new(101, "general").in_guild(CONSOLE_GUILD_ID))).await;
    cache.insert(guild, Entity::Role(Role::new(300, "moderators", CONSOLE_GUILD_ID))).await;
    cache
}

/// Prints replies as `bot> ...`, one line per reply line.
pub struct ConsoleReplies {
    color: bool,
}

impl Default for ConsoleReplies {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReplies {
    pub fn new() -> Self {
        Self { color: supports_color() }
    }

    fn render(&self, content: &str) -> String {
        let tag = if self.color { format!("{GREEN}{BOLD}bot>{RESET}") } else { "bot>".to_string() };
        content.lines().map(|line| format!("{tag} {line}")).collect::<Vec<_>>().join("\n")
    }
}

#[async_trait]
impl ReplySink for ConsoleReplies {
    async fn send(&self, channel_id: Snowflake, content: &str) -> Result<()> {
        debug!(channel = %channel_id, "Console reply");
        println!("{}", self.render(content));
        Ok(())
    }
}

/// Announce the connection, then forward every non-blank stdin line until EOF.
pub async fn pump_stdin(tx: mpsc::Sender<GatewayEvent>) -> Result<()> {
    tx.send(GatewayEvent::Ready).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id = 1;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        tx.send(GatewayEvent::MessageCreate(to_message(next_id, &line))).await?;
        next_id += 1;
    }
    debug!(messages = next_id - 1, "Console input closed");
    Ok(())
}
