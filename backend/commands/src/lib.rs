pub mod binder;
pub mod checks;
pub mod command;
pub mod context;
pub mod converter;
pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod signature;
pub mod tokenizer;
pub mod value;

pub use binder::{bind, RawBinding};
pub use checks::{guild_only, owner_only};
pub use command::{
    check_fn, error_hook_fn, handler_fn, predicate, Check, Command, CommandHandler, CommandOwner,
    ErrorHook, Invocation,
};
pub use context::{Context, Services};
pub use converter::{Converter, ConverterChain, EntityConverter};
pub use dispatch::{resolve_prefix, DispatchOutcome, Dispatcher, Prefix};
pub use handlers::{help_command, HelpHandler};
pub use registry::CommandRegistry;
pub use signature::{ArityKind, Param, ParamType, Signature, TypeSpec};
pub use tokenizer::{split, tokenize, Token, Tokens};
pub use value::{BoundArgs, Value};
