/// Invocation context handed to checks, converters and handlers.
use std::sync::Arc;

use anyhow::Result;
use parley_core::{
    EntityCache, Entity, Message, RemoteLookup, ReplySink, Snowflake, User,
};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::converter::ConverterChain;
use crate::registry::CommandRegistry;

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Shared collaborators reachable from every context.
pub struct Services {
    pub registry: CommandRegistry,
    pub converters: ConverterChain,
    pub cache: Option<Arc<dyn EntityCache>>,
    pub remote: Option<Arc<dyn RemoteLookup>>,
    pub replies: Arc<dyn ReplySink>,
    owner_ids: Vec<Snowflake>,
    remote_owners: OnceCell<Vec<Snowflake>>,
}

impl Services {
    pub fn new(replies: Arc<dyn ReplySink>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            converters: ConverterChain::new(),
            cache: None,
            remote: None,
            replies,
            owner_ids: Vec::new(),
            remote_owners: OnceCell::new(),
        }
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_converters(mut self, converters: ConverterChain) -> Self {
        self.converters = converters;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn EntityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteLookup>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_owner_ids(mut self, owner_ids: impl IntoIterator<Item = Snowflake>) -> Self {
        self.owner_ids = owner_ids.into_iter().collect();
        self
    }

    /// Configured owners win; otherwise the application owners are fetched
    /// once and cached. A failed fetch is not cached and means "not owner".
    pub async fn is_owner(&self, id: Snowflake) -> bool {
        if !self.owner_ids.is_empty() {
            return self.owner_ids.contains(&id);
        }
        let Some(remote) = self.remote.as_ref() else {
            return false;
        };
        match self.remote_owners.get_or_try_init(|| remote.application_owners()).await {
            Ok(owners) => owners.contains(&id),
            Err(e) => {
                debug!(error = %e, "Application owner lookup failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// One invocation's view of the world: the message, how the command was
/// reached, and the shared services.
#[derive(Clone)]
pub struct Context {
    message: Arc<Message>,
    prefix: String,
    invoked_with: String,
    command: String,
    subcommand_path: Vec<String>,
    services: Arc<Services>,
}

impl Context {
    pub fn new(
        message: Arc<Message>,
        prefix: impl Into<String>,
        invoked_with: impl Into<String>,
        command: impl Into<String>,
        services: Arc<Services>,
    ) -> Self {
        Self {
            message,
            prefix: prefix.into(),
            invoked_with: invoked_with.into(),
            command: command.into(),
            subcommand_path: Vec::new(),
            services,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn channel_id(&self) -> Snowflake {
        self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<Snowflake> {
        self.message.guild_id
    }

    pub fn mentions(&self) -> &[Entity] {
        &self.message.mentions
    }

    /// The prefix the message matched.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The name or alias exactly as typed.
    pub fn invoked_with(&self) -> &str {
        &self.invoked_with
    }

    /// Canonical name of the top-level command.
    pub fn command_name(&self) -> &str {
        &self.command
    }

    pub fn subcommand_path(&self) -> &[String] {
        &self.subcommand_path
    }

    /// Command name plus every subcommand walked, space separated.
    pub fn qualified_name(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.subcommand_path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// A context one subcommand level deeper.
    pub fn descend(&self, subcommand: &str) -> Self {
        let mut next = self.clone();
        next.subcommand_path.push(subcommand.to_string());
        next
    }

    /// Reply in the invoking channel.
    pub async fn send(&self, content: impl AsRef<str>) -> Result<()> {
        self.services.replies.send(self.channel_id(), content.as_ref()).await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("message", &self.message.id)
            .field("prefix", &self.prefix)
            .field("invoked_with", &self.invoked_with)
            .field("command", &self.command)
            .field("subcommand_path", &self.subcommand_path)
            .finish()
    }
}

/// Test doubles shared by the crate's test modules and by downstream crates' tests.
#[doc(hidden)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Reply sink that keeps every reply in memory.
    #[derive(Default)]
    pub struct RecordingReplies {
        sent: Mutex<Vec<(Snowflake, String)>>,
    }

    impl RecordingReplies {
        pub fn sent(&self) -> Vec<(Snowflake, String)> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        pub fn contents(&self) -> Vec<String> {
            self.sent().into_iter().map(|(_, c)| c).collect()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingReplies {
        async fn send(&self, channel_id: Snowflake, content: &str) -> Result<()> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((channel_id, content.to_string()));
            }
            Ok(())
        }
    }

    pub fn replies() -> Arc<RecordingReplies> {
        Arc::new(RecordingReplies::default())
    }

    pub fn context(message: Message) -> Context {
        context_with(message, Services::new(replies()))
    }

    pub fn context_with(message: Message, services: Services) -> Context {
        Context::new(Arc::new(message), "!", "test", "test", Arc::new(services))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_core::EntityKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Owners {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteLookup for Owners {
        async fn fetch(&self, _kind: EntityKind, _id: Snowflake) -> Result<Entity> {
            anyhow::bail!("not used")
        }

        async fn application_owners(&self) -> Result<Vec<Snowflake>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Snowflake(1)])
        }
    }

    fn message() -> Message {
        Message::new(1, 2, User::new(3, "caller"), "!x")
    }

    #[tokio::test]
    async fn configured_owners_take_precedence() {
        let services = Services::new(testing::replies()).with_owner_ids([Snowflake(3)]);
        assert!(services.is_owner(Snowflake(3)).await);
        assert!(!services.is_owner(Snowflake(1)).await);
    }

    #[tokio::test]
    async fn remote_owners_are_fetched_once() {
        let remote = Arc::new(Owners { calls: AtomicUsize::new(0) });
        let services = Services::new(testing::replies()).with_remote(remote.clone());
        assert!(services.is_owner(Snowflake(1)).await);
        assert!(!services.is_owner(Snowflake(2)).await);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_owner_source_means_nobody() {
        let services = Services::new(testing::replies());
        assert!(!services.is_owner(Snowflake(1)).await);
    }

    #[tokio::test]
    async fn descend_tracks_subcommands() {
        let ctx = testing::context(message());
        let deeper = ctx.descend("add").descend("role");
        assert_eq!(deeper.qualified_name(), "test add role");
        assert!(ctx.subcommand_path().is_empty());
    }

    #[tokio::test]
    async fn send_replies_in_invoking_channel() {
        let replies = testing::replies();
        let ctx = testing::context_with(message(), Services::new(replies.clone()));
        ctx.send("pong").await.unwrap();
        assert_eq!(replies.sent(), vec![(Snowflake(2), "pong".to_string())]);
    }
}
