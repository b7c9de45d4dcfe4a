//! Converter chain: raw token → typed [`Value`].
//!
//! Every parameter type maps to one converter. A parameter with a union type
//! tries each member's converter in order and keeps the first truthy result.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parley_core::{parse_mention, ArgumentError, CacheScope, Entity, EntityKind, Snowflake};
use tracing::{debug, info, warn};

use crate::binder::RawBinding;
use crate::context::Context;
use crate::signature::{ArityKind, Param, ParamType, Signature, TypeSpec};
use crate::value::{BoundArgs, Value};

/// Turns one raw token into a value. `None` means "not mine, try the next candidate".
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, ctx: &Context, raw: &str) -> Option<Value>;
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

pub struct StrConverter;

#[async_trait]
impl Converter for StrConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        Some(Value::Str(raw.to_string()))
    }
}

pub struct IntConverter;

#[async_trait]
impl Converter for IntConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        raw.parse::<i64>().ok().map(Value::Int)
    }
}

pub struct FloatConverter;

#[async_trait]
impl Converter for FloatConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float)
    }
}

pub struct BoolConverter;

#[async_trait]
impl Converter for BoolConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "n" | "off" | "0" => Some(Value::Bool(false)),
            _ => None,
        }
    }
}

/// Bare digits or a mention, without any lookup.
pub struct SnowflakeConverter;

#[async_trait]
impl Converter for SnowflakeConverter {
    async fn convert(&self, _ctx: &Context, raw: &str) -> Option<Value> {
        Snowflake::parse(raw).or_else(|| parse_mention(raw)).map(Value::Snowflake)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Resolves users, members, channels and roles.
///
/// Lookup order: the cached pool (plus message mentions and the invoking
/// channel), then an identifier or mention match against that pool, then a
/// remote fetch by identifier, then a name search over the pool.
pub struct EntityConverter {
    kind: EntityKind,
}

impl EntityConverter {
    pub fn new(kind: EntityKind) -> Self {
        Self { kind }
    }

    async fn pool(&self, ctx: &Context) -> Vec<Entity> {
        let cache = ctx.services().cache.clone();
        let cached = |scope: CacheScope| {
            let cache = cache.clone();
            let kind = self.kind;
            async move {
                match cache {
                    Some(cache) => cache.entities(kind, scope).await,
                    None => Vec::new(),
                }
            }
        };
        let message = ctx.message();

        match self.kind {
            EntityKind::User => {
                let mut pool = cached(CacheScope::Global).await;
                pool.extend(message.mentions.iter().filter_map(|e| e.as_user().cloned().map(Entity::User)));
                pool
            }
            EntityKind::Member => {
                let mut pool = match message.guild_id {
                    Some(guild) => cached(CacheScope::Guild(guild)).await,
                    None => Vec::new(),
                };
                pool.extend(message.mentions.iter().filter(|e| matches!(e, Entity::Member(_))).cloned());
                pool
            }
            EntityKind::Channel => {
                let mut pool = cached(CacheScope::Global).await;
                pool.extend(message.channel.clone().map(Entity::Channel));
                pool
            }
            EntityKind::Role => {
                let mut pool = cached(CacheScope::Global).await;
                if let Some(guild) = message.guild_id {
                    pool.extend(cached(CacheScope::Guild(guild)).await);
                }
                pool
            }
        }
    }

    fn matches_name(&self, entity: &Entity, raw: &str) -> bool {
        match entity {
            Entity::User(u) => u.username == raw,
            Entity::Member(m) => m.to_string() == raw,
            Entity::Channel(c) => c.name == raw,
            Entity::Role(r) => r.name == raw,
        }
    }
}

fn into_value(entity: Entity) -> Value {
    match entity {
        Entity::User(u) => Value::User(u),
        Entity::Member(m) => Value::Member(m),
        Entity::Channel(c) => Value::Channel(c),
        Entity::Role(r) => Value::Role(r),
    }
}

#[async_trait]
impl Converter for EntityConverter {
    async fn convert(&self, ctx: &Context, raw: &str) -> Option<Value> {
        let pool = self.pool(ctx).await;

        if let Some(id) = Snowflake::parse(raw).or_else(|| parse_mention(raw)) {
            if let Some(found) = pool.iter().find(|e| e.id() == id) {
                return Some(into_value(found.clone()));
            }
            if let Some(remote) = ctx.services().remote.as_ref() {
                match remote.fetch(self.kind, id).await {
                    Ok(entity) if entity.kind() == self.kind => return Some(into_value(entity)),
                    Ok(entity) => {
                        debug!(id = %id, expected = ?self.kind, got = ?entity.kind(), "Remote lookup returned another kind")
                    }
                    Err(e) => debug!(id = %id, kind = ?self.kind, error = %e, "Remote lookup failed"),
                }
            }
        }

        if let Some(found) = pool.iter().find(|e| self.matches_name(e, raw)) {
            return Some(into_value(found.clone()));
        }
        // Users also match on their full `name#discriminator` form.
        if self.kind == EntityKind::User {
            return pool
                .into_iter()
                .find(|e| e.as_user().is_some_and(|u| u.to_string() == raw))
                .map(into_value);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Registered converters keyed by type name, plus the conversion policy.
#[derive(Clone)]
pub struct ConverterChain {
    converters: HashMap<String, Arc<dyn Converter>>,
    falsy_falls_through: bool,
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterChain {
    /// A chain with every built-in converter registered.
    pub fn new() -> Self {
        let mut converters: HashMap<String, Arc<dyn Converter>> = HashMap::new();
        converters.insert(ParamType::Str.name().into(), Arc::new(StrConverter));
        converters.insert(ParamType::Int.name().into(), Arc::new(IntConverter));
        converters.insert(ParamType::Float.name().into(), Arc::new(FloatConverter));
        converters.insert(ParamType::Bool.name().into(), Arc::new(BoolConverter));
        converters.insert(ParamType::Snowflake.name().into(), Arc::new(SnowflakeConverter));
        for (ty, kind) in [
            (ParamType::User, EntityKind::User),
            (ParamType::Member, EntityKind::Member),
            (ParamType::Channel, EntityKind::Channel),
            (ParamType::Role, EntityKind::Role),
        ] {
            converters.insert(ty.name().into(), Arc::new(EntityConverter::new(kind)));
        }
        Self { converters, falsy_falls_through: true }
    }

    /// When set (the default), a falsy conversion result such as `0` or `""`
    /// counts as a miss and the next candidate is tried.
    pub fn falsy_falls_through(mut self, enabled: bool) -> Self {
        self.falsy_falls_through = enabled;
        self
    }

    /// Register a converter under `name`, for use through `ParamType::Custom(name)`.
    pub fn register(mut self, name: impl Into<String>, converter: impl Converter + 'static) -> Self {
        let name = name.into();
        if self.converters.insert(name.clone(), Arc::new(converter)).is_some() {
            info!(converter = %name, "Converter replaced");
        }
        self
    }

    pub fn resolve(&self, ty: &ParamType) -> Option<Arc<dyn Converter>> {
        self.converters.get(ty.name()).cloned()
    }

    /// A parsed `false` is an answer, not a miss.
    fn accepts(&self, value: &Value) -> bool {
        !self.falsy_falls_through || value.is_truthy() || matches!(value, Value::Bool(_))
    }

    /// Try each candidate in order; the first accepted result wins.
    pub async fn convert(&self, ctx: &Context, raw: &str, candidates: &[ParamType]) -> Result<Value, ArgumentError> {
        for ty in candidates {
            let Some(converter) = self.resolve(ty) else {
                warn!(converter = %ty.name(), "Unknown converter type, skipping");
                continue;
            };
            if let Some(value) = converter.convert(ctx, raw).await {
                if self.accepts(&value) {
                    return Ok(value);
                }
            }
        }
        Err(ArgumentError::ConversionFailed { value: raw.to_string() })
    }

    /// Like [`convert`](Self::convert) but never fails: returns the first
    /// accepted result, else the last result any candidate produced.
    pub async fn convert_safe(&self, ctx: &Context, raw: &str, candidates: &[ParamType]) -> Option<Value> {
        let mut last = None;
        for ty in candidates {
            let Some(converter) = self.resolve(ty) else { continue };
            if let Some(value) = converter.convert(ctx, raw).await {
                if self.accepts(&value) {
                    return Some(value);
                }
                last = Some(value);
            }
        }
        last
    }

    /// Untyped parameters take the raw text as-is, empty strings included.
    pub async fn convert_param(&self, ctx: &Context, param: &Param, raw: &str) -> Result<Value, ArgumentError> {
        if param.ty == TypeSpec::Untyped {
            return Ok(Value::Str(raw.to_string()));
        }
        self.convert(ctx, raw, &param.ty.candidates()).await
    }

    /// Convert a whole binding. Every argument is converted concurrently; the
    /// first failure in declaration order is reported.
    pub async fn convert_binding(
        &self,
        ctx: &Context,
        signature: &Arc<Signature>,
        binding: RawBinding,
    ) -> Result<BoundArgs, ArgumentError> {
        let params = signature.params();
        let positional = binding.positional.iter().enumerate().map(|(i, raw)| {
            // Surplus tokens belong to a trailing variadic parameter.
            let param = params.get(i).or_else(|| params.last().filter(|p| p.kind == ArityKind::VariadicRest));
            async move {
                match param {
                    Some(param) => self.convert_param(ctx, param, raw).await,
                    None => Ok(Value::Str(raw.clone())),
                }
            }
        });
        let positional = join_all(positional).await.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut keyword = HashMap::new();
        for (name, raw) in binding.keyword {
            let value = match (raw, signature.get(&name)) {
                (Some(raw), Some(param)) => self.convert_param(ctx, param, &raw).await?,
                (Some(raw), None) => Value::Str(raw),
                (None, _) => Value::Null,
            };
            keyword.insert(name, value);
        }

        Ok(BoundArgs::new(signature.clone(), positional, keyword))
    }
}
