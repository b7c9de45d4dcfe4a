//! Addons, listeners, hot-swappable modules and the [`Bot`] that ties them
//! to the command dispatcher.

pub mod addon;
pub mod bot;
pub mod event_bus;
pub mod lifecycle;
pub mod module;

pub use addon::{Addon, AddonHook, Listener, LoadedAddon};
pub use bot::{Bot, BotBuilder, AddonFactory};
pub use event_bus::{BotEvent, EventBus, ListenerFn, ListenerId, COMMAND_ERROR};
pub use lifecycle::{run_load_sequence, run_unload_sequence, AddonStatus};
pub use module::{EntryPoint, ModuleCatalog, ModuleSpec};
