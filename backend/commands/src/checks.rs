/// Ready-made checks.
use std::sync::Arc;

use crate::command::{check_fn, predicate, Check};
use crate::context::Context;

/// Passes only for bot owners (configured ids, else the application owners).
pub fn owner_only() -> Arc<dyn Check> {
    check_fn(|ctx: Context| async move { ctx.services().is_owner(ctx.author().id).await })
}

/// Passes only for messages sent inside a guild.
pub fn guild_only() -> Arc<dyn Check> {
    predicate(|ctx| ctx.guild_id().is_some())
}
