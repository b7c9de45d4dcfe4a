use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::entity::{Entity, EntityKind, Snowflake};

/// Which container of the entity cache to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Global,
    Guild(Snowflake),
}

/// Previously seen platform entities, consulted by converters before any remote lookup.
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Snapshot every cached entity of `kind` in `scope`.
    async fn entities(&self, kind: EntityKind, scope: CacheScope) -> Vec<Entity>;
}

/// Remote lookups against the platform API.
///
/// Only used as a converter fallback; callers treat every failure as "not found".
#[async_trait]
pub trait RemoteLookup: Send + Sync {
    async fn fetch(&self, kind: EntityKind, id: Snowflake) -> Result<Entity>;

    /// Owners of the bot application.
    async fn application_owners(&self) -> Result<Vec<Snowflake>>;
}

/// Outbound reply channel handed to command handlers through their context.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, channel_id: Snowflake, content: &str) -> Result<()>;
}

/// Reply sink that only logs. Useful when no platform connection is wired up.
pub struct LogReplies;

#[async_trait]
impl ReplySink for LogReplies {
    async fn send(&self, channel_id: Snowflake, content: &str) -> Result<()> {
        info!(channel = %channel_id, content, "Reply");
        Ok(())
    }
}
