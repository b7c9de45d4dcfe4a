pub mod cache;
pub mod channel;
pub mod entity;
pub mod error;
pub mod event;
pub mod message;
pub mod traits;

pub use cache::InMemoryEntityCache;
pub use channel::GatewayBus;
pub use entity::{parse_mention, Channel, Entity, EntityKind, Member, Role, Snowflake, User};
pub use error::{
    ArgumentError, CommandError, ModuleError, ParleyError, RegistryError, SignatureError,
};
pub use event::{normalize_event_name, GatewayEvent};
pub use message::Message;
pub use traits::{CacheScope, EntityCache, LogReplies, RemoteLookup, ReplySink};
