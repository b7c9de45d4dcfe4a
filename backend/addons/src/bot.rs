//! The bot: one command registry shared by every addon and module, the
//! listener bus, and the loop that feeds gateway events through both.

use std::sync::Arc;

use parley_commands::{
    help_command, Command, CommandRegistry, Context, ConverterChain, DispatchOutcome, Dispatcher, Prefix,
    Services,
};
use parley_config::defaults::DEFAULT_PREFIX;
use parley_config::BotConfig;
use parley_core::{
    CommandError, EntityCache, GatewayEvent, LogReplies, Message, ModuleError, ParleyError, RegistryError,
    RemoteLookup, ReplySink, Snowflake,
};
use parley_logging::{CommandEvent, CommandEventEntry, EventLogger};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::addon::{Addon, Listener, LoadedAddon};
use crate::event_bus::{BotEvent, EventBus, ListenerId, COMMAND_ERROR};
use crate::lifecycle::{run_load_sequence, run_unload_sequence};
use crate::module::{ModuleCatalog, ModuleSpec};

/// Builds an addon against the bot it will be registered with.
pub type AddonFactory = fn(&Bot) -> Addon;

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct BotBuilder {
    prefixes: Vec<Prefix>,
    ignore_bots: bool,
    converters: ConverterChain,
    falsy_falls_through: Option<bool>,
    cache: Option<Arc<dyn EntityCache>>,
    remote: Option<Arc<dyn RemoteLookup>>,
    replies: Option<Arc<dyn ReplySink>>,
    owner_ids: Vec<Snowflake>,
    help: bool,
    modules: Vec<ModuleSpec>,
    autoload: Vec<String>,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self {
            prefixes: Vec::new(),
            ignore_bots: true,
            converters: ConverterChain::new(),
            falsy_falls_through: None,
            cache: None,
            remote: None,
            replies: None,
            owner_ids: Vec::new(),
            help: false,
            modules: Vec::new(),
            autoload: Vec::new(),
        }
    }
}

impl BotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefixes, owners, bot filtering, conversion policy and startup modules
    /// from a loaded config.
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            prefixes: vec![Prefix::many(config.prefixes())],
            ignore_bots: config.ignore_bots(),
            falsy_falls_through: Some(config.falsy_falls_through()),
            owner_ids: config.owner_ids.iter().copied().map(Snowflake).collect(),
            autoload: config.modules.clone(),
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(Prefix::fixed(prefix));
        self
    }

    /// Add a prefix source; sources are consulted in the order added.
    pub fn prefix_source(mut self, prefix: Prefix) -> Self {
        self.prefixes.push(prefix);
        self
    }

    pub fn ignore_bots(mut self, ignore: bool) -> Self {
        self.ignore_bots = ignore;
        self
    }

    /// Replace the converter chain, e.g. one with custom converters registered.
    pub fn converters(mut self, converters: ConverterChain) -> Self {
        self.converters = converters;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn EntityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteLookup>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn replies(mut self, replies: Arc<dyn ReplySink>) -> Self {
        self.replies = Some(replies);
        self
    }

    pub fn owner_ids(mut self, ids: impl IntoIterator<Item = Snowflake>) -> Self {
        self.owner_ids = ids.into_iter().collect();
        self
    }

    /// Register the built-in `help` command.
    pub fn with_help(mut self) -> Self {
        self.help = true;
        self
    }

    /// Make a module loadable by path.
    pub fn module(mut self, spec: ModuleSpec) -> Self {
        self.modules.push(spec);
        self
    }

    /// Load a module during [`build`](Self::build).
    pub fn autoload(mut self, path: impl Into<String>) -> Self {
        self.autoload.push(path.into());
        self
    }

    pub async fn build(self) -> Result<Bot, ParleyError> {
        let prefixes = if self.prefixes.is_empty() {
            vec![Prefix::fixed(DEFAULT_PREFIX)]
        } else {
            self.prefixes
        };
        let converters = match self.falsy_falls_through {
            Some(enabled) => self.converters.falsy_falls_through(enabled),
            None => self.converters,
        };

        let replies = self.replies.unwrap_or_else(|| Arc::new(LogReplies));
        let mut services = Services::new(replies)
            .with_converters(converters)
            .with_owner_ids(self.owner_ids);
        if let Some(cache) = self.cache {
            services = services.with_cache(cache);
        }
        if let Some(remote) = self.remote {
            services = services.with_remote(remote);
        }

        let dispatcher = Dispatcher::new(Arc::new(services), prefixes).ignore_bots(self.ignore_bots);
        let bot = Bot {
            inner: Arc::new(BotInner {
                dispatcher,
                events: EventBus::new(),
                addons: RwLock::new(Vec::new()),
                modules: ModuleCatalog::new(),
                loaded_modules: Mutex::new(Vec::new()),
            }),
        };

        for spec in self.modules {
            bot.inner.modules.register(spec).await;
        }
        if self.help {
            bot.add_command(help_command()).await?;
        }
        for path in &self.autoload {
            bot.load_module(path).await?;
        }

        info!(modules = self.autoload.len(), ignore_bots = self.ignore_bots, "Bot ready");
        Ok(bot)
    }
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

struct BotInner {
    dispatcher: Dispatcher,
    events: EventBus,
    /// Registration order is kept.
    addons: RwLock<Vec<Arc<LoadedAddon>>>,
    modules: ModuleCatalog,
    /// Held for the whole of a module operation, entry point included.
    loaded_modules: Mutex<Vec<String>>,
}

/// Cheap to clone; every clone drives the same bot.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    pub fn services(&self) -> &Arc<Services> {
        self.inner.dispatcher.services()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.services().registry
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn modules(&self) -> &ModuleCatalog {
        &self.inner.modules
    }

    // -- Commands ----------------------------------------------------------

    pub async fn add_command(&self, command: Command) -> Result<(), RegistryError> {
        self.registry().add_command(command).await
    }

    pub async fn remove_command(&self, name: &str) -> Option<Arc<Command>> {
        self.registry().remove_command(name).await
    }

    // -- Addons ------------------------------------------------------------

    /// Register addons in order. Each addon is all-or-nothing: a name or
    /// command collision rolls back that addon and stops the batch, leaving
    /// the addons before it registered. `on_load` hooks run once the batch
    /// is done.
    pub async fn register_addons(&self, addons: Vec<Addon>) -> Result<(), RegistryError> {
        let mut registered = Vec::new();
        let mut result = Ok(());
        {
            let mut loaded = self.inner.addons.write().await;
            for addon in addons {
                if loaded.iter().any(|a| a.name() == addon.name()) {
                    result = Err(RegistryError::AddonAlreadyLoaded { name: addon.name().to_string() });
                    break;
                }
                let (addon, commands, listeners) = addon.into_parts();
                if let Err(e) = self.registry().add_commands(commands).await {
                    result = Err(e);
                    break;
                }
                for listener in &listeners {
                    self.inner
                        .events
                        .subscribe(listener.event(), Some(addon.clone()), listener.handler())
                        .await;
                }
                info!(addon = %addon.name(), commands = addon.command_names().len(), listeners = listeners.len(), "Addon registered");
                loaded.push(addon.clone());
                registered.push(addon);
            }
        }

        for addon in &registered {
            run_load_sequence(addon).await;
        }
        result
    }

    /// Build each addon against this bot, then register them.
    pub async fn load_addons(&self, factories: &[AddonFactory]) -> Result<(), RegistryError> {
        let addons = factories.iter().map(|factory| factory(self)).collect();
        self.register_addons(addons).await
    }

    /// Remove addons with their commands and listeners, then run their
    /// `on_unload` hooks. Unknown names are skipped. Returns the names removed.
    pub async fn unload_addons<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        let mut removed = Vec::new();
        {
            let mut loaded = self.inner.addons.write().await;
            for name in names {
                let name = name.as_ref();
                let Some(pos) = loaded.iter().position(|a| a.name() == name) else {
                    debug!(addon = %name, "Unload of unknown addon ignored");
                    continue;
                };
                let addon = loaded.remove(pos);
                self.registry().remove_commands(addon.command_names()).await;
                let listeners = self.inner.events.unsubscribe_addon(name).await;
                info!(addon = %name, listeners, "Addon removed");
                removed.push(addon);
            }
        }

        for addon in &removed {
            run_unload_sequence(addon).await;
        }
        removed.iter().map(|a| a.name().to_string()).collect()
    }

    pub async fn addon(&self, name: &str) -> Option<Arc<LoadedAddon>> {
        self.inner.addons.read().await.iter().find(|a| a.name() == name).cloned()
    }

    pub async fn addon_names(&self) -> Vec<String> {
        self.inner.addons.read().await.iter().map(|a| a.name().to_string()).collect()
    }

    // -- Modules -----------------------------------------------------------

    /// Run a catalogued module's `load` entry point and mark it loaded.
    ///
    /// Entry points must not load or unload modules themselves.
    pub async fn load_module(&self, path: &str) -> Result<(), ModuleError> {
        let Some(spec) = self.inner.modules.get(path).await else {
            return Err(ModuleError::InvalidModule { path: path.to_string() });
        };
        let mut loaded = self.inner.loaded_modules.lock().await;
        if loaded.iter().any(|p| p == path) {
            return Err(ModuleError::ModuleAlreadyLoaded { path: path.to_string() });
        }
        let Some(load) = spec.load() else {
            return Err(ModuleError::MissingLoadFunction { path: path.to_string() });
        };
        load(self.clone())
            .await
            .map_err(|e| ModuleError::EntryPointFailed { path: path.to_string(), message: e.to_string() })?;
        loaded.push(path.to_string());
        info!(module = %path, "Module loaded");
        Ok(())
    }

    pub async fn unload_module(&self, path: &str) -> Result<(), ModuleError> {
        let Some(spec) = self.inner.modules.get(path).await else {
            return Err(ModuleError::InvalidModule { path: path.to_string() });
        };
        let mut loaded = self.inner.loaded_modules.lock().await;
        let Some(pos) = loaded.iter().position(|p| p == path) else {
            return Err(ModuleError::ModuleNotLoaded { path: path.to_string() });
        };
        let Some(unload) = spec.unload() else {
            return Err(ModuleError::MissingUnloadFunction { path: path.to_string() });
        };
        unload(self.clone())
            .await
            .map_err(|e| ModuleError::EntryPointFailed { path: path.to_string(), message: e.to_string() })?;
        loaded.remove(pos);
        info!(module = %path, "Module unloaded");
        Ok(())
    }

    /// Unload, then load with the current catalog entry. Not atomic: when the
    /// load fails the module stays unloaded.
    pub async fn reload_module(&self, path: &str) -> Result<(), ModuleError> {
        self.unload_module(path).await?;
        self.load_module(path).await
    }

    pub async fn loaded_modules(&self) -> Vec<String> {
        self.inner.loaded_modules.lock().await.clone()
    }

    // -- Runtime -----------------------------------------------------------

    pub async fn is_owner(&self, ctx: &Context) -> bool {
        self.services().is_owner(ctx.author().id).await
    }

    /// Listen for an event outside of any addon.
    pub async fn on(&self, listener: Listener) -> ListenerId {
        self.inner.events.subscribe(listener.event(), None, listener.handler()).await
    }

    /// Dispatch one message. Unhandled failures go to `COMMAND_ERROR`
    /// listeners, or to the error log when there are none.
    pub async fn handle_message(&self, message: Message) -> DispatchOutcome {
        let message = Arc::new(message);
        let outcome = self.inner.dispatcher.dispatch(message.clone()).await;
        record_outcome(&message, &outcome);
        if let DispatchOutcome::Failed { context, error } = &outcome {
            self.report_error(context.clone(), error.clone()).await;
        }
        outcome
    }

    async fn report_error(&self, context: Context, error: Arc<CommandError>) {
        if self.inner.events.has_listeners(COMMAND_ERROR).await {
            self.inner.events.publish(BotEvent::CommandError { context, error }).await;
        } else {
            error!(command = %context.qualified_name(), error = %error, "Error while executing command");
        }
    }

    /// Publish a gateway event to listeners, then dispatch it if it is a message.
    pub async fn handle_event(&self, event: GatewayEvent) {
        self.inner.events.publish(BotEvent::Gateway(event.clone())).await;
        if let GatewayEvent::MessageCreate(message) = event {
            self.handle_message(message).await;
        }
    }

    /// Consume gateway events until the sender side closes. Every event is
    /// handled on its own task; in-flight tasks are awaited before returning.
    pub async fn run(&self, mut events: mpsc::Receiver<GatewayEvent>) {
        info!("Bot event loop started");
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let bot = self.clone();
                        tasks.spawn(async move { bot.handle_event(event).await });
                    }
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Event task failed");
                    }
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Event task failed");
            }
        }
        info!("Gateway closed, bot event loop stopped");
    }
}

fn record_outcome(message: &Message, outcome: &DispatchOutcome) {
    let (command, event) = match outcome {
        DispatchOutcome::Ignored => return,
        DispatchOutcome::Completed { command } => (command.clone(), CommandEvent::Completed),
        DispatchOutcome::Handled { command, error } => {
            (command.clone(), CommandEvent::Handled { error: error.to_string() })
        }
        DispatchOutcome::Failed { context, error } => {
            (context.command_name().to_string(), CommandEvent::Failed { error: error.to_string() })
        }
    };
    EventLogger::log_event(&CommandEventEntry::new(
        command,
        message.author.id.get(),
        message.channel_id.get(),
        event,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::AddonStatus;
    use parley_commands::context::testing::{self, RecordingReplies};
    use parley_commands::{
        error_hook_fn, handler_fn, owner_only, predicate, Invocation, Param, ParamType, Signature,
    };
    use parley_core::{GatewayBus, User};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn bot() -> (Bot, Arc<RecordingReplies>) {
        let replies = testing::replies();
        let bot = Bot::builder().prefix("!").replies(replies.clone()).build().await.unwrap();
        (bot, replies)
    }

    fn msg(content: &str) -> Message {
        Message::new(1, 2, User::new(3, "caller"), content)
    }

    fn reply(name: &str, text: &'static str) -> Command {
        Command::new(
            name,
            Signature::empty(),
            handler_fn(move |inv: Invocation| async move { inv.ctx.send(text).await }),
        )
    }

    struct Greeting(String);

    fn greeter() -> Addon {
        Addon::new("greeter")
            .data(Greeting("hello".into()))
            .command(
                Command::new(
                    "greet",
                    Signature::new(vec![Param::new("who")]).unwrap(),
                    handler_fn(|inv: Invocation| async move {
                        let greeting = inv.addon_state::<Greeting>().map(|g| g.0.clone()).unwrap_or_default();
                        let who = inv.args.str("who").unwrap_or_default().to_string();
                        inv.ctx.send(format!("{greeting} {who}")).await
                    }),
                )
                .alias("hi"),
            )
            .command(reply("wave", "o/"))
    }

    #[tokio::test]
    async fn addon_commands_see_addon_state() {
        let (bot, replies) = bot().await;
        bot.register_addons(vec![greeter()]).await.unwrap();
        assert_eq!(bot.addon("greeter").await.unwrap().status().await, AddonStatus::Active);

        let outcome = bot.handle_message(msg("!hi bob")).await;
        assert!(matches!(outcome, DispatchOutcome::Completed { ref command } if command == "greet"));
        assert_eq!(replies.contents(), vec!["hello bob"]);
    }

    #[tokio::test]
    async fn duplicate_addon_is_rejected() {
        let (bot, _) = bot().await;
        bot.register_addons(vec![greeter()]).await.unwrap();
        let err = bot.register_addons(vec![greeter()]).await.unwrap_err();
        assert_eq!(err, RegistryError::AddonAlreadyLoaded { name: "greeter".into() });
        assert_eq!(bot.addon_names().await, vec!["greeter"]);
    }

    #[tokio::test]
    async fn colliding_addon_is_rolled_back() {
        let (bot, _) = bot().await;
        bot.register_addons(vec![greeter()]).await.unwrap();

        let clash = Addon::new("clash")
            .command(reply("fresh", "new"))
            .command(reply("other", "x").alias("hi"))
            .listener(Listener::on("ready", |_, _| async { anyhow::Ok(()) }));
        let err = bot.register_addons(vec![clash]).await.unwrap_err();
        assert_eq!(err, RegistryError::CommandAlreadyExists { name: "hi".into() });

        assert!(bot.addon("clash").await.is_none());
        assert!(!bot.registry().contains("fresh").await);
        assert!(!bot.events().has_listeners("READY").await);
        assert_eq!(bot.registry().get("hi").await.map(|c| c.name().to_string()), Some("greet".into()));
    }

    #[tokio::test]
    async fn unload_removes_everything_and_allows_reregistering() {
        let (bot, _) = bot().await;
        let unloaded = Arc::new(AtomicUsize::new(0));
        let counter = unloaded.clone();
        let addon = greeter()
            .listener(Listener::on("on_ready", |_, _| async { anyhow::Ok(()) }))
            .on_unload(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            });
        bot.register_addons(vec![addon]).await.unwrap();
        let handle = bot.addon("greeter").await.unwrap();

        assert_eq!(bot.unload_addons(&["greeter", "missing"]).await, vec!["greeter"]);
        assert_eq!(unloaded.load(Ordering::SeqCst), 1);
        assert_eq!(handle.status().await, AddonStatus::Unloaded);
        assert!(bot.registry().is_empty().await);
        assert!(!bot.registry().contains("hi").await);
        assert!(!bot.events().has_listeners("READY").await);
        assert!(bot.handle_message(msg("!greet bob")).await.is_ignored());

        bot.register_addons(vec![greeter()]).await.unwrap();
        assert!(bot.registry().contains("greet").await);
    }

    #[tokio::test]
    async fn addon_gate_and_error_hook() {
        let (bot, replies) = bot().await;
        let addon = Addon::new("locked")
            .command(reply("secret", "shh"))
            .gate(predicate(|_| false))
            .on_command_error(error_hook_fn(|ctx: Context, err| async move {
                ctx.send(format!("denied: {err}")).await.is_ok()
            }));
        bot.register_addons(vec![addon]).await.unwrap();

        let outcome = bot.handle_message(msg("!secret")).await;
        assert!(matches!(outcome, DispatchOutcome::Handled { .. }));
        assert_eq!(replies.contents(), vec!["denied: command check has failed for 'secret'"]);
    }

    #[tokio::test]
    async fn unhandled_errors_reach_command_error_listeners() {
        let (bot, _) = bot().await;
        bot.add_command(Command::new(
            "fail",
            Signature::empty(),
            handler_fn(|_| async { Err(anyhow::anyhow!("broken")) }),
        ))
        .await
        .unwrap();

        // No listener: logged only.
        assert!(matches!(bot.handle_message(msg("!fail")).await, DispatchOutcome::Failed { .. }));

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        bot.on(Listener::on("on_command_error", move |addon, event| {
            let sink = sink.clone();
            async move {
                assert!(addon.is_none());
                if let BotEvent::CommandError { context, error } = event {
                    sink.lock().unwrap().push(format!("{}: {error}", context.command_name()));
                }
                anyhow::Ok(())
            }
        }))
        .await;
        bot.handle_message(msg("!fail")).await;
        assert_eq!(seen.lock().unwrap().as_slice(), ["fail: command handler failed: broken"]);
    }

    fn greeter_module(path: &str) -> ModuleSpec {
        ModuleSpec::new(path)
            .on_load(|bot: Bot| async move {
                bot.register_addons(vec![greeter()]).await?;
                anyhow::Ok(())
            })
            .on_unload(|bot: Bot| async move {
                bot.unload_addons(&["greeter"]).await;
                anyhow::Ok(())
            })
    }

    #[tokio::test]
    async fn module_lifecycle() {
        let replies = testing::replies();
        let bot = Bot::builder()
            .replies(replies.clone())
            .module(greeter_module("ext.greeter"))
            .module(ModuleSpec::new("ext.empty"))
            .module(ModuleSpec::new("ext.load_only").on_load(|_| async { anyhow::Ok(()) }))
            .build()
            .await
            .unwrap();

        assert_eq!(
            bot.load_module("ext.nope").await,
            Err(ModuleError::InvalidModule { path: "ext.nope".into() })
        );
        assert_eq!(
            bot.load_module("ext.empty").await,
            Err(ModuleError::MissingLoadFunction { path: "ext.empty".into() })
        );
        assert_eq!(
            bot.unload_module("ext.greeter").await,
            Err(ModuleError::ModuleNotLoaded { path: "ext.greeter".into() })
        );

        bot.load_module("ext.greeter").await.unwrap();
        assert_eq!(
            bot.load_module("ext.greeter").await,
            Err(ModuleError::ModuleAlreadyLoaded { path: "ext.greeter".into() })
        );
        assert_eq!(bot.addon_names().await, vec!["greeter"]);

        bot.load_module("ext.load_only").await.unwrap();
        assert_eq!(
            bot.unload_module("ext.load_only").await,
            Err(ModuleError::MissingUnloadFunction { path: "ext.load_only".into() })
        );

        bot.unload_module("ext.greeter").await.unwrap();
        assert!(bot.addon_names().await.is_empty());
        assert_eq!(bot.loaded_modules().await, vec!["ext.load_only"]);
    }

    #[tokio::test]
    async fn reload_picks_up_replaced_spec() {
        let (bot, replies) = bot().await;
        bot.modules()
            .register(ModuleSpec::new("ext.pong").on_load(|bot: Bot| async move {
                bot.add_command(reply("ping", "pong")).await?;
                anyhow::Ok(())
            }).on_unload(|bot: Bot| async move {
                bot.remove_command("ping").await;
                anyhow::Ok(())
            }))
            .await;
        bot.load_module("ext.pong").await.unwrap();

        bot.modules()
            .register(ModuleSpec::new("ext.pong").on_load(|bot: Bot| async move {
                bot.add_command(reply("ping", "PONG v2")).await?;
                anyhow::Ok(())
            }).on_unload(|bot: Bot| async move {
                bot.remove_command("ping").await;
                anyhow::Ok(())
            }))
            .await;
        bot.reload_module("ext.pong").await.unwrap();

        bot.handle_message(msg("!ping")).await;
        assert_eq!(replies.contents(), vec!["PONG v2"]);
    }

    #[tokio::test]
    async fn failed_reload_leaves_module_unloaded() {
        let (bot, _) = bot().await;
        bot.modules().register(greeter_module("ext.greeter")).await;
        bot.load_module("ext.greeter").await.unwrap();

        bot.modules()
            .register(
                ModuleSpec::new("ext.greeter")
                    .on_load(|_| async { Err(anyhow::anyhow!("syntax error")) })
                    .on_unload(|bot: Bot| async move {
                        bot.unload_addons(&["greeter"]).await;
                        anyhow::Ok(())
                    }),
            )
            .await;
        let err = bot.reload_module("ext.greeter").await.unwrap_err();
        assert_eq!(
            err,
            ModuleError::EntryPointFailed { path: "ext.greeter".into(), message: "syntax error".into() }
        );
        assert!(bot.loaded_modules().await.is_empty());
        assert!(bot.addon_names().await.is_empty());
    }

    fn waver(_bot: &Bot) -> Addon {
        Addon::new("waver").command(reply("wave", "o/"))
    }

    fn pinger(_bot: &Bot) -> Addon {
        Addon::new("pinger").command(reply("ping", "pong"))
    }

    #[tokio::test]
    async fn load_addons_from_factories() {
        let (bot, _) = bot().await;
        bot.load_addons(&[waver, pinger]).await.unwrap();
        assert_eq!(bot.addon_names().await, vec!["waver", "pinger"]);
    }

    #[tokio::test]
    async fn build_from_config() {
        let config = BotConfig {
            prefixes: Some(vec!["?".into()]),
            owner_ids: vec![3],
            modules: vec!["ext.greeter".into()],
            ..BotConfig::default()
        };
        let replies = testing::replies();
        let bot = BotBuilder::from_config(&config)
            .replies(replies.clone())
            .module(greeter_module("ext.greeter"))
            .with_help()
            .build()
            .await
            .unwrap();

        assert_eq!(bot.loaded_modules().await, vec!["ext.greeter"]);
        bot.add_command(reply("sudo", "yes boss").check(owner_only())).await.unwrap();
        bot.handle_message(msg("?sudo")).await;
        bot.handle_message(msg("!sudo")).await;
        bot.handle_message(msg("?help")).await;
        let out = replies.contents();
        assert_eq!(out[0], "yes boss");
        assert_eq!(out.len(), 2);
        assert!(out[1].contains("`?greet <who>`"));
    }

    #[tokio::test]
    async fn build_fails_on_unknown_autoload() {
        let err = Bot::builder().autoload("ext.missing").build().await.err().unwrap();
        assert!(matches!(err, ParleyError::Module(ModuleError::InvalidModule { .. })));
    }

    #[tokio::test]
    async fn run_loop_handles_every_event() {
        let (bot, replies) = bot().await;
        bot.add_command(reply("ping", "pong")).await.unwrap();
        let ready = Arc::new(AtomicUsize::new(0));
        let counter = ready.clone();
        bot.on(Listener::on("ready", move |_, _| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(())
            }
        }))
        .await;

        let mut bus = GatewayBus::new();
        let rx = bus.take_rx().unwrap();
        let tx = bus.sender();
        let runner = tokio::spawn({
            let bot = bot.clone();
            async move { bot.run(rx).await }
        });

        tx.send(GatewayEvent::Ready).await.unwrap();
        for _ in 0..3 {
            tx.send(GatewayEvent::MessageCreate(msg("!ping"))).await.unwrap();
        }
        drop(tx);
        drop(bus);
        runner.await.unwrap();

        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(replies.contents(), vec!["pong"; 3]);
    }

    #[tokio::test]
    async fn bot_authors_are_ignored_by_default() {
        let (bot, replies) = bot().await;
        bot.add_command(reply("ping", "pong")).await.unwrap();
        let from_bot = Message::new(1, 2, User::new(9, "robot").bot(), "!ping");
        assert!(bot.handle_message(from_bot).await.is_ignored());
        assert!(replies.contents().is_empty());
    }

    #[tokio::test]
    async fn custom_parameter_types_use_registered_converters() {
        use async_trait::async_trait;
        use parley_commands::{Converter, Value};

        struct Shout;

        #[async_trait]
        impl Converter for Shout {
            async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
                Some(Value::Str(raw.to_uppercase()))
            }
        }

        let replies = testing::replies();
        let bot = Bot::builder()
            .replies(replies.clone())
            .converters(ConverterChain::new().register("shout", Shout))
            .build()
            .await
            .unwrap();
        bot.add_command(Command::new(
            "yell",
            Signature::new(vec![Param::new("text").typed(ParamType::custom("shout"))]).unwrap(),
            handler_fn(|inv: Invocation| async move {
                let text = inv.args.str("text").unwrap_or_default().to_string();
                inv.ctx.send(text).await
            }),
        ))
        .await
        .unwrap();

        bot.handle_message(msg("!yell quiet")).await;
        assert_eq!(replies.contents(), vec!["QUIET"]);
    }
}
