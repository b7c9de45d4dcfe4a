/// Command entities and the traits they are assembled from.
///
/// A command is a handler plus its signature, name and aliases, checks, an
/// optional error hook and nested subcommands. Invocation runs the checks,
/// walks into a subcommand when the first token names one, then binds,
/// converts and calls the handler.
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parley_core::{ArgumentError, CommandError};
use tracing::debug;

use crate::binder::bind;
use crate::context::Context;
use crate::signature::Signature;
use crate::tokenizer::{split, tokenize};
use crate::value::BoundArgs;

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// The addon a command belongs to, as seen from the command side.
#[async_trait]
pub trait CommandOwner: Send + Sync {
    fn name(&self) -> &str;

    /// Addon state handed to handlers through [`Invocation::addon_state`].
    fn state(&self) -> Arc<dyn Any + Send + Sync>;

    /// Addon-wide check, evaluated before the command's own checks.
    async fn gate(&self, _ctx: &Context) -> bool {
        true
    }

    /// Addon-wide error hook. Return `true` when the error was handled.
    async fn on_command_error(&self, _ctx: &Context, _error: Arc<CommandError>) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Everything a handler receives.
pub struct Invocation {
    pub ctx: Context,
    pub args: BoundArgs,
    /// Owning addon of the command level that was actually invoked.
    pub addon: Option<Arc<dyn CommandOwner>>,
}

impl Invocation {
    /// Downcast the owning addon's state.
    pub fn addon_state<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.addon.as_ref()?.state().downcast::<T>().ok()
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, invocation: Invocation) -> Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn call(&self, invocation: Invocation) -> Result<()> {
        (self.0)(invocation).await
    }
}

/// Wrap an async closure as a handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

// ---------------------------------------------------------------------------
// Checks and error hooks
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Check: Send + Sync {
    async fn check(&self, ctx: &Context) -> bool;
}

struct FnCheck<F>(F);

#[async_trait]
impl<F, Fut> Check for FnCheck<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn check(&self, ctx: &Context) -> bool {
        (self.0)(ctx.clone()).await
    }
}

struct Predicate<F>(F);

#[async_trait]
impl<F> Check for Predicate<F>
where
    F: Fn(&Context) -> bool + Send + Sync,
{
    async fn check(&self, ctx: &Context) -> bool {
        (self.0)(ctx)
    }
}

/// Wrap an async closure as a check.
pub fn check_fn<F, Fut>(f: F) -> Arc<dyn Check>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(FnCheck(f))
}

/// Wrap a synchronous predicate as a check.
pub fn predicate<F>(f: F) -> Arc<dyn Check>
where
    F: Fn(&Context) -> bool + Send + Sync + 'static,
{
    Arc::new(Predicate(f))
}

/// Per-command error hook. Return `true` when the error was handled.
#[async_trait]
pub trait ErrorHook: Send + Sync {
    async fn on_error(&self, ctx: &Context, error: Arc<CommandError>) -> bool;
}

struct FnErrorHook<F>(F);

#[async_trait]
impl<F, Fut> ErrorHook for FnErrorHook<F>
where
    F: Fn(Context, Arc<CommandError>) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn on_error(&self, ctx: &Context, error: Arc<CommandError>) -> bool {
        (self.0)(ctx.clone(), error).await
    }
}

pub fn error_hook_fn<F, Fut>(f: F) -> Arc<dyn ErrorHook>
where
    F: Fn(Context, Arc<CommandError>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(FnErrorHook(f))
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    signature: Arc<Signature>,
    handler: Arc<dyn CommandHandler>,
    checks: Vec<Arc<dyn Check>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    subcommands: Vec<Command>,
    owner: Option<Arc<dyn CommandOwner>>,
}

impl Command {
    pub fn new(name: impl Into<String>, signature: Signature, handler: Arc<dyn CommandHandler>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            signature: Arc::new(signature),
            handler,
            checks: Vec::new(),
            error_hook: None,
            subcommands: Vec::new(),
            owner: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn check(mut self, check: Arc<dyn Check>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn on_error(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Attach a subcommand; one with the same name is replaced.
    pub fn subcommand(mut self, sub: Command) -> Self {
        self.subcommands.retain(|c| c.name != sub.name);
        self.subcommands.push(sub);
        self
    }

    /// Set the owning addon on this command and every nested subcommand.
    pub fn assign_owner(&mut self, owner: Arc<dyn CommandOwner>) {
        for sub in &mut self.subcommands {
            sub.assign_owner(owner.clone());
        }
        self.owner = Some(owner);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn signature(&self) -> &Arc<Signature> {
        &self.signature
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    pub fn owner(&self) -> Option<&Arc<dyn CommandOwner>> {
        self.owner.as_ref()
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.name())
    }

    /// Subcommand by name, then by alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.subcommands.iter().find(|c| c.aliases.iter().any(|a| a == name)))
    }

    /// Evaluate the addon gate (when `with_gate`) and then every check.
    /// All of them run, in order; the result is false if any returned false.
    pub async fn run_checks(&self, ctx: &Context, with_gate: bool) -> bool {
        let mut passed = true;
        if with_gate {
            if let Some(owner) = &self.owner {
                passed &= owner.gate(ctx).await;
            }
        }
        for check in &self.checks {
            passed &= check.check(ctx).await;
        }
        passed
    }

    /// Run this command's own error hook. Returns whether the error was handled.
    pub async fn execute_error_handler(&self, ctx: &Context, error: Arc<CommandError>) -> bool {
        match &self.error_hook {
            Some(hook) => hook.on_error(ctx, error).await,
            None => false,
        }
    }

    /// Invoke with the argument text that followed the command name.
    pub fn invoke<'a>(&'a self, ctx: &'a Context, input: &'a str) -> BoxFuture<'a, Result<(), CommandError>> {
        self.invoke_level(ctx, input, true)
    }

    fn invoke_level<'a>(
        &'a self,
        ctx: &'a Context,
        input: &'a str,
        top_level: bool,
    ) -> BoxFuture<'a, Result<(), CommandError>> {
        async move {
            if !self.run_checks(ctx, top_level).await {
                return Err(CommandError::CheckFailed { command: ctx.qualified_name() });
            }

            if !self.subcommands.is_empty() {
                let mut tokens = tokenize(input);
                if let Some(first) = tokens.next() {
                    let Some(sub) = self.find_subcommand(first.text) else {
                        return Err(CommandError::InvalidSubcommand {
                            command: ctx.qualified_name(),
                            given: first.text.to_string(),
                        });
                    };
                    let deeper = ctx.descend(&sub.name);
                    return sub.invoke_level(&deeper, tokens.remainder(), false).await;
                }
            } else if self.signature.is_empty() && !input.trim().is_empty() {
                let got = split(input).len();
                return Err(ArgumentError::ArgumentCount { expected: 0, got }.into());
            }

            let binding = bind(input, &self.signature, !self.subcommands.is_empty())?;
            let args = ctx
                .services()
                .converters
                .convert_binding(ctx, &self.signature, binding)
                .await?;

            debug!(command = %ctx.qualified_name(), addon = ?self.owner_name(), "Invoking command handler");
            let invocation = Invocation { ctx: ctx.clone(), args, addon: self.owner.clone() };
            self.handler.call(invocation).await.map_err(CommandError::Handler)
        }
        .boxed()
    }

    /// One-line usage, e.g. `ban <target> [reason...]`.
    pub fn usage(&self) -> String {
        let params = self.signature.usage();
        if params.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, params)
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("signature", &self.signature)
            .field("checks", &self.checks.len())
            .field("subcommands", &self.subcommands)
            .field("owner", &self.owner_name())
            .finish()
    }
}
