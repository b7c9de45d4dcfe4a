/// Message dispatch: prefix resolution, command lookup, invocation and the
/// error-hook chain.
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parley_core::{CommandError, Message};
use tracing::debug;

use crate::command::Command;
use crate::context::{Context, Services};

// ---------------------------------------------------------------------------
// Prefix
// ---------------------------------------------------------------------------

type SyncPrefixFn = dyn Fn(&Message) -> Vec<String> + Send + Sync;
type AsyncPrefixFn = dyn Fn(Arc<Message>) -> BoxFuture<'static, Vec<String>> + Send + Sync;

/// A source of candidate prefixes, resolved per message.
#[derive(Clone)]
pub enum Prefix {
    Static(Vec<String>),
    Sync(Arc<SyncPrefixFn>),
    Async(Arc<AsyncPrefixFn>),
}

impl Prefix {
    pub fn fixed(prefix: impl Into<String>) -> Self {
        Prefix::Static(vec![prefix.into()])
    }

    pub fn many<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Prefix::Static(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Message) -> Vec<String> + Send + Sync + 'static,
    {
        Prefix::Sync(Arc::new(f))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<String>> + Send + 'static,
    {
        Prefix::Async(Arc::new(move |message| f(message).boxed()))
    }

    async fn candidates(&self, message: &Arc<Message>) -> Vec<String> {
        match self {
            Prefix::Static(prefixes) => prefixes.clone(),
            Prefix::Sync(f) => f(message),
            Prefix::Async(f) => f(message.clone()).await,
        }
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Static(prefixes) => f.debug_tuple("Static").field(prefixes).finish(),
            Prefix::Sync(_) => f.write_str("Sync(..)"),
            Prefix::Async(_) => f.write_str("Async(..)"),
        }
    }
}

/// Collect every candidate from every source in declared order, then return
/// the first one the message starts with.
pub async fn resolve_prefix(prefixes: &[Prefix], message: &Arc<Message>) -> Option<String> {
    let mut candidates = Vec::new();
    for prefix in prefixes {
        candidates.extend(prefix.candidates(message).await);
    }
    candidates.into_iter().find(|c| message.content.starts_with(c.as_str()))
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// What happened to one message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command invocation; nothing ran.
    Ignored,
    Completed { command: String },
    /// Failed, and an error hook reported the failure as handled.
    Handled { command: String, error: Arc<CommandError> },
    /// Failed and nothing handled it.
    Failed { context: Context, error: Arc<CommandError> },
}

impl DispatchOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, DispatchOutcome::Ignored)
    }
}

pub struct Dispatcher {
    prefixes: Vec<Prefix>,
    services: Arc<Services>,
    ignore_bots: bool,
}

impl Dispatcher {
    pub fn new(services: Arc<Services>, prefixes: Vec<Prefix>) -> Self {
        Self { prefixes, services, ignore_bots: true }
    }

    pub fn ignore_bots(mut self, ignore: bool) -> Self {
        self.ignore_bots = ignore;
        self
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    /// Run one message through the pipeline. Never panics or returns an error:
    /// failures come back as [`DispatchOutcome::Failed`] for the caller to report.
    pub async fn dispatch(&self, message: Arc<Message>) -> DispatchOutcome {
        if self.ignore_bots && message.author.bot {
            return DispatchOutcome::Ignored;
        }
        if message.content.is_empty() {
            return DispatchOutcome::Ignored;
        }
        let Some(prefix) = resolve_prefix(&self.prefixes, &message).await else {
            return DispatchOutcome::Ignored;
        };

        let body = message.content[prefix.len()..].trim_start();
        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (body, ""),
        };
        if name.is_empty() {
            return DispatchOutcome::Ignored;
        }
        let Some(command) = self.services.registry.get(name).await else {
            return DispatchOutcome::Ignored;
        };

        let ctx = Context::new(message.clone(), prefix, name, command.name(), self.services.clone());
        debug!(command = %command.name(), invoked_with = %name, "Executing command");

        match command.invoke(&ctx, rest).await {
            Ok(()) => DispatchOutcome::Completed { command: command.name().to_string() },
            Err(error) => self.handle_error(&command, ctx, Arc::new(error)).await,
        }
    }

    /// The command's own hook first, then its addon's hook.
    async fn handle_error(&self, command: &Command, ctx: Context, error: Arc<CommandError>) -> DispatchOutcome {
        if command.execute_error_handler(&ctx, error.clone()).await {
            return DispatchOutcome::Handled { command: command.name().to_string(), error };
        }
        if let Some(owner) = command.owner() {
            if owner.on_command_error(&ctx, error.clone()).await {
                return DispatchOutcome::Handled { command: command.name().to_string(), error };
            }
        }
        DispatchOutcome::Failed { context: ctx, error }
    }
}
