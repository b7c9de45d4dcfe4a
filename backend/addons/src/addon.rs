//! Addon definitions and their registered form.
//!
//! An [`Addon`] is assembled with a builder: commands, listeners, an addon-wide
//! gate and error hook, lifecycle hooks and a state value shared with every
//! handler it owns. Registering it with a bot turns it into a [`LoadedAddon`].

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parley_commands::{Check, Command, CommandOwner, Context, ErrorHook};
use parley_core::{CommandError, normalize_event_name};
use tokio::sync::RwLock;

use crate::event_bus::{BotEvent, ListenerFn};
use crate::lifecycle::AddonStatus;

/// Hook run once when an addon finishes registering, or after it was removed.
pub type AddonHook = Arc<dyn Fn(Arc<LoadedAddon>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// An event handler declared by an addon (or directly on the bot).
#[derive(Clone)]
pub struct Listener {
    event: String,
    handler: ListenerFn,
}

impl Listener {
    /// Listen for `event`. The name is normalized, so `on_ready` and `READY`
    /// are the same event. The handler receives the owning addon, if any.
    pub fn on<F, Fut>(event: &str, f: F) -> Self
    where
        F: Fn(Option<Arc<LoadedAddon>>, BotEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            event: normalize_event_name(event),
            handler: Arc::new(move |addon, event| f(addon, event).boxed()),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn handler(&self) -> ListenerFn {
        self.handler.clone()
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("event", &self.event).finish()
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

pub struct Addon {
    name: String,
    data: Arc<dyn Any + Send + Sync>,
    commands: Vec<Command>,
    listeners: Vec<Listener>,
    gate: Option<Arc<dyn Check>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    on_load: Option<AddonHook>,
    on_unload: Option<AddonHook>,
}

impl Addon {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Arc::new(()),
            commands: Vec::new(),
            listeners: Vec::new(),
            gate: None,
            error_hook: None,
            on_load: None,
            on_unload: None,
        }
    }

    /// State shared with handlers through `Invocation::addon_state`.
    pub fn data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Arc::new(data);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn listener(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Addon-wide check, evaluated before each owned command's own checks.
    pub fn gate(mut self, check: Arc<dyn Check>) -> Self {
        self.gate = Some(check);
        self
    }

    /// Error hook tried after a failing command's own hook.
    pub fn on_command_error(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.error_hook = Some(hook);
        self
    }

    pub fn on_load<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<LoadedAddon>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_load = Some(Arc::new(move |addon| f(addon).boxed()));
        self
    }

    pub fn on_unload<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<LoadedAddon>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_unload = Some(Arc::new(move |addon| f(addon).boxed()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Split into the registered addon plus the commands (already owned by
    /// it) and listeners still to be registered.
    pub(crate) fn into_parts(self) -> (Arc<LoadedAddon>, Vec<Command>, Vec<Listener>) {
        let loaded = Arc::new(LoadedAddon {
            command_names: self.commands.iter().map(|c| c.name().to_string()).collect(),
            name: self.name,
            data: self.data,
            gate: self.gate,
            error_hook: self.error_hook,
            on_load: self.on_load,
            on_unload: self.on_unload,
            status: RwLock::new(AddonStatus::Loading),
        });
        let mut commands = self.commands;
        for command in &mut commands {
            command.assign_owner(loaded.clone());
        }
        (loaded, commands, self.listeners)
    }
}

// ---------------------------------------------------------------------------
// Registered addon
// ---------------------------------------------------------------------------

/// An addon as held by a running bot.
pub struct LoadedAddon {
    name: String,
    data: Arc<dyn Any + Send + Sync>,
    gate: Option<Arc<dyn Check>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
    pub(crate) on_load: Option<AddonHook>,
    pub(crate) on_unload: Option<AddonHook>,
    command_names: Vec<String>,
    status: RwLock<AddonStatus>,
}

impl LoadedAddon {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone().downcast::<T>().ok()
    }

    /// Names of the top-level commands this addon registered.
    pub fn command_names(&self) -> &[String] {
        &self.command_names
    }

    pub async fn status(&self) -> AddonStatus {
        *self.status.read().await
    }

    pub(crate) async fn set_status(&self, status: AddonStatus) {
        *self.status.write().await = status;
    }
}

#[async_trait]
impl CommandOwner for LoadedAddon {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Arc<dyn Any + Send + Sync> {
        self.data.clone()
    }

    async fn gate(&self, ctx: &Context) -> bool {
        match &self.gate {
            Some(check) => check.check(ctx).await,
            None => true,
        }
    }

    async fn on_command_error(&self, ctx: &Context, error: Arc<CommandError>) -> bool {
        match &self.error_hook {
            Some(hook) => hook.on_error(ctx, error).await,
            None => false,
        }
    }
}

impl std::fmt::Debug for LoadedAddon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAddon")
            .field("name", &self.name)
            .field("commands", &self.command_names)
            .finish()
    }
}
