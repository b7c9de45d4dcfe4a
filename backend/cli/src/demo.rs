//! Demo addons served by the console runner, packaged as two modules so
//! they can be unloaded and reloaded from the console itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parley_addons::{Addon, Bot, BotBuilder, Listener, ModuleSpec};
use parley_commands::{
    error_hook_fn, handler_fn, owner_only, Command, Context, Converter, ConverterChain, Invocation, Param,
    ParamType, Signature, Value,
};
use parley_config::BotConfig;
use parley_core::{CommandError, ModuleError, ReplySink, Snowflake};
use tracing::info;

use crate::console::{seeded_cache, CONSOLE_USER_ID};

pub const DEMO_MODULE: &str = "parley.demo";
pub const ADMIN_MODULE: &str = "parley.admin";

const COLOR_TYPE: &str = "color";
const MAX_ECHO: i64 = 5;

/// A bot wired for the console: seeded entity cache, demo converters, help,
/// and both demo modules. Without configured owners the console user owns
/// the bot; without configured modules both demo modules load.
pub async fn console_bot(config: &BotConfig, replies: Arc<dyn ReplySink>) -> Result<Bot> {
    let mut builder = BotBuilder::from_config(config)
        .replies(replies)
        .cache(Arc::new(seeded_cache().await))
        .converters(converters())
        .with_help();
    if config.owner_ids.is_empty() {
        builder = builder.owner_ids([Snowflake(CONSOLE_USER_ID)]);
    }
    for spec in modules() {
        builder = builder.module(spec);
    }
    if config.modules.is_empty() {
        builder = builder.autoload(DEMO_MODULE).autoload(ADMIN_MODULE);
    }
    Ok(builder.build().await?)
}

pub fn modules() -> Vec<ModuleSpec> {
    vec![
        ModuleSpec::new(DEMO_MODULE)
            .on_load(|bot: Bot| async move {
                bot.register_addons(vec![demo_addon()?]).await?;
                anyhow::Ok(())
            })
            .on_unload(|bot: Bot| async move {
                bot.unload_addons(&["demo"]).await;
                anyhow::Ok(())
            }),
        ModuleSpec::new(ADMIN_MODULE)
            .on_load(|bot: Bot| async move {
                let addon = admin_addon(&bot)?;
                bot.register_addons(vec![addon]).await?;
                anyhow::Ok(())
            })
            .on_unload(|bot: Bot| async move {
                bot.unload_addons(&["admin"]).await;
                anyhow::Ok(())
            }),
    ]
}

pub fn converters() -> ConverterChain {
    ConverterChain::new().register(COLOR_TYPE, ColorConverter)
}

// ---------------------------------------------------------------------------
// Color converter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// A handful of names, or `#rrggbb`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "red" => Some(Rgb(255, 0, 0)),
            "green" => Some(Rgb(0, 128, 0)),
            "blue" => Some(Rgb(0, 0, 255)),
            "white" => Some(Rgb(255, 255, 255)),
            "black" => Some(Rgb(0, 0, 0)),
            other => {
                let hex = other.strip_prefix('#')?;
                if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
            }
        }
    }
}

struct ColorConverter;

#[async_trait]
impl Converter for ColorConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        Rgb::parse(raw).map(Value::custom)
    }
}

// ---------------------------------------------------------------------------
// Demo addon
// ---------------------------------------------------------------------------

#[derive(Default)]
struct DemoState {
    messages: AtomicU64,
}

pub fn demo_addon() -> Result<Addon> {
    Ok(Addon::new("demo")
        .data(DemoState::default())
        .command(ping())
        .command(echo()?)
        .command(greet()?)
        .command(math()?)
        .command(whois()?)
        .command(paint()?)
        .command(stats())
        .listener(Listener::on("on_ready", |_, _| async {
            info!("Console connected");
            anyhow::Ok(())
        }))
        .listener(Listener::on("message_create", |addon, _| async move {
            if let Some(state) = addon.and_then(|a| a.data::<DemoState>()) {
                state.messages.fetch_add(1, Ordering::Relaxed);
            }
            anyhow::Ok(())
        }))
        .on_command_error(error_hook_fn(|ctx: Context, error: Arc<CommandError>| async move {
            match &*error {
                CommandError::InvalidArgument(_) | CommandError::InvalidSubcommand { .. } => ctx
                    .send(format!("⚠️ {error}. Try `{}help {}`", ctx.prefix(), ctx.command_name()))
                    .await
                    .is_ok(),
                _ => false,
            }
        }))
        .on_load(|addon| async move {
            info!(addon = %addon.name(), "Demo commands ready");
            anyhow::Ok(())
        }))
}

fn ping() -> Command {
    Command::new("ping", Signature::empty(), handler_fn(|inv: Invocation| async move { inv.ctx.send("pong 🏓").await }))
        .describe("Check that the bot is alive.")
}

fn echo() -> Result<Command> {
    let signature = Signature::new(vec![
        Param::new("times").typed(ParamType::Int).describe("How many times"),
        Param::new("text").keyword_rest().describe("What to say"),
    ])?;
    let handler = handler_fn(|inv: Invocation| async move {
        let times = inv.args.int("times").unwrap_or(1).clamp(1, MAX_ECHO) as usize;
        let text = inv.args.str("text").unwrap_or_default();
        let out = vec![text; times].join(" ");
        inv.ctx.send(out).await
    });
    Ok(Command::new("echo", signature, handler).alias("say").describe("Repeat some text."))
}

fn greet() -> Result<Command> {
    let signature = Signature::new(vec![Param::new("name").default("world")])?;
    let handler = handler_fn(|inv: Invocation| async move {
        let name = inv.args.str("name").unwrap_or("world");
        inv.ctx.send(format!("👋 Hello, {name}!")).await
    });
    Ok(Command::new("greet", signature, handler).describe("Say hello."))
}

fn math() -> Result<Command> {
    let add = Command::new(
        "add",
        Signature::new(vec![
            Param::new("a").typed(ParamType::Float),
            Param::new("b").typed(ParamType::Float),
        ])?,
        handler_fn(|inv: Invocation| async move {
            let a = inv.args.float("a").unwrap_or_default();
            let b = inv.args.float("b").unwrap_or_default();
            inv.ctx.send(format!("{a} + {b} = {}", a + b)).await
        }),
    )
    .alias("plus")
    .describe("Add two numbers.");

    let sum = Command::new(
        "sum",
        Signature::new(vec![
            Param::new("first").typed(ParamType::Float),
            Param::new("rest").typed(ParamType::Float).variadic().optional(),
        ])?,
        handler_fn(|inv: Invocation| async move {
            let numbers: Vec<f64> = inv.args.positional().iter().filter_map(Value::as_float).collect();
            let total: f64 = numbers.iter().sum();
            inv.ctx.send(format!("Σ of {} numbers = {total}", numbers.len())).await
        }),
    )
    .describe("Add any amount of numbers.");

    let usage = handler_fn(|inv: Invocation| async move {
        let p = inv.ctx.prefix();
        inv.ctx.send(format!("Usage: `{p}math add <a> <b>` or `{p}math sum <first> [rest*]`")).await
    });
    Ok(Command::new("math", Signature::empty(), usage)
        .describe("Arithmetic.")
        .subcommand(add)
        .subcommand(sum))
}

fn whois() -> Result<Command> {
    let signature = Signature::new(vec![Param::new("target")
        .union([ParamType::Member, ParamType::User, ParamType::Str])
        .describe("Mention, id or name")])?;
    let handler = handler_fn(|inv: Invocation| async move {
        let reply = match inv.args.get("target") {
            Some(Value::Member(member)) => {
                format!("{} is {} (id {})", member.display_name(), member.user, member.id())
            }
            Some(Value::User(user)) => format!("{user} (id {})", user.id),
            Some(other) => format!("🤷 I don't know anyone called {other}"),
            None => "🤷".to_string(),
        };
        inv.ctx.send(reply).await
    });
    Ok(Command::new("whois", signature, handler).describe("Look someone up."))
}

fn paint() -> Result<Command> {
    let signature = Signature::new(vec![Param::new("color").typed(ParamType::custom(COLOR_TYPE))])?;
    let handler = handler_fn(|inv: Invocation| async move {
        let Some(Rgb(r, g, b)) = inv.args.get("color").and_then(|v| v.downcast::<Rgb>()).map(|c| *c) else {
            return inv.ctx.send("🎨 That is not a color.").await;
        };
        inv.ctx.send(format!("🎨 rgb({r}, {g}, {b}) / #{r:02x}{g:02x}{b:02x}")).await
    });
    Ok(Command::new("paint", signature, handler).alias("color").describe("Parse a color name or #rrggbb."))
}

fn stats() -> Command {
    let handler = handler_fn(|inv: Invocation| async move {
        let seen = inv.addon_state::<DemoState>().map_or(0, |s| s.messages.load(Ordering::Relaxed));
        inv.ctx.send(format!("📊 {seen} messages seen since the demo addon loaded")).await
    });
    Command::new("stats", Signature::empty(), handler).describe("Messages seen by the demo addon.")
}

// ---------------------------------------------------------------------------
// Admin addon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum ModuleOp {
    Load,
    Unload,
    Reload,
}

impl ModuleOp {
    fn name(self) -> &'static str {
        match self {
            ModuleOp::Load => "load",
            ModuleOp::Unload => "unload",
            ModuleOp::Reload => "reload",
        }
    }

    fn done(self) -> &'static str {
        match self {
            ModuleOp::Load => "Loaded",
            ModuleOp::Unload => "Unloaded",
            ModuleOp::Reload => "Reloaded",
        }
    }

    async fn apply(self, bot: &Bot, path: &str) -> Result<(), ModuleError> {
        match self {
            ModuleOp::Load => bot.load_module(path).await,
            ModuleOp::Unload => bot.unload_module(path).await,
            ModuleOp::Reload => bot.reload_module(path).await,
        }
    }
}

fn module_command(bot: &Bot, op: ModuleOp) -> Result<Command> {
    let signature = Signature::new(vec![Param::new("module").describe("Module path")])?;
    let bot = bot.clone();
    let handler = handler_fn(move |inv: Invocation| {
        let bot = bot.clone();
        async move {
            let path = inv.args.str("module").unwrap_or_default().to_string();
            let reply = match op.apply(&bot, &path).await {
                Ok(()) => format!("✅ {} `{path}`", op.done()),
                Err(e) => format!("❌ {e}"),
            };
            inv.ctx.send(reply).await
        }
    });
    Ok(Command::new(op.name(), signature, handler).describe(format!("{} a module.", op.done())))
}

pub fn admin_addon(bot: &Bot) -> Result<Addon> {
    let listing = {
        let bot = bot.clone();
        handler_fn(move |inv: Invocation| {
            let bot = bot.clone();
            async move {
                let mut lines = Vec::new();
                for name in bot.addon_names().await {
                    if let Some(addon) = bot.addon(&name).await {
                        lines.push(format!("• {name} ({:?}, {} commands)", addon.status().await, addon.command_names().len()));
                    }
                }
                lines.push(format!("Modules: {}", bot.loaded_modules().await.join(", ")));
                inv.ctx.send(lines.join("\n")).await
            }
        })
    };

    Ok(Addon::new("admin")
        .gate(owner_only())
        .command(module_command(bot, ModuleOp::Load)?)
        .command(module_command(bot, ModuleOp::Unload)?)
        .command(module_command(bot, ModuleOp::Reload)?)
        .command(Command::new("addons", Signature::empty(), listing).describe("List loaded addons and modules."))
        .on_command_error(error_hook_fn(|ctx: Context, error: Arc<CommandError>| async move {
            match &*error {
                CommandError::CheckFailed { .. } => ctx.send("⛔ Only bot owners can do that.").await.is_ok(),
                _ => false,
            }
        })))
}
