//! Typed argument values and the per-invocation argument bundle.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parley_core::{Channel, Member, Role, Snowflake, User};

use crate::signature::{ArityKind, Signature};

/// A converted argument.
#[derive(Clone)]
pub enum Value {
    /// An absent keyword-rest capture.
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Snowflake(Snowflake),
    User(User),
    Member(Member),
    Channel(Channel),
    Role(Role),
    /// Output of a user-registered converter.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Truthiness used by the converter chain: empty strings, zero numbers,
    /// `false`, zero identifiers and `Null` are falsy; entities are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Str(s) => !s.is_empty(),
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::Snowflake(id) => id.get() != 0,
            Value::User(_) | Value::Member(_) | Value::Channel(_) | Value::Role(_) => true,
            Value::Custom(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Identifier of a snowflake or of any entity value.
    pub fn as_snowflake(&self) -> Option<Snowflake> {
        match self {
            Value::Snowflake(id) => Some(*id),
            Value::User(u) => Some(u.id),
            Value::Member(m) => Some(m.id()),
            Value::Channel(c) => Some(c.id),
            Value::Role(r) => Some(r.id),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Value::User(u) => Some(u),
            Value::Member(m) => Some(&m.user),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Value::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Value::Channel(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            Value::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Custom(inner) => inner.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Snowflake(id) => f.debug_tuple("Snowflake").field(id).finish(),
            Value::User(u) => f.debug_tuple("User").field(u).finish(),
            Value::Member(m) => f.debug_tuple("Member").field(m).finish(),
            Value::Channel(c) => f.debug_tuple("Channel").field(c).finish(),
            Value::Role(r) => f.debug_tuple("Role").field(r).finish(),
            Value::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Snowflake(a), Value::Snowflake(b)) => a == b,
            (Value::User(a), Value::User(b)) => a == b,
            (Value::Member(a), Value::Member(b)) => a == b,
            (Value::Channel(a), Value::Channel(b)) => a == b,
            (Value::Role(a), Value::Role(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Snowflake(id) => write!(f, "{id}"),
            Value::User(u) => write!(f, "{u}"),
            Value::Member(m) => write!(f, "{m}"),
            Value::Channel(c) => write!(f, "#{}", c.name),
            Value::Role(r) => write!(f, "@{}", r.name),
            Value::Custom(_) => f.write_str("<custom>"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Converted arguments for one invocation: positional values in declaration
/// order plus the keyword-rest capture, if the signature has one.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    positional: Vec<Value>,
    keyword: HashMap<String, Value>,
    signature: Arc<Signature>,
}

impl BoundArgs {
    pub fn new(signature: Arc<Signature>, positional: Vec<Value>, keyword: HashMap<String, Value>) -> Self {
        Self { positional, keyword, signature }
    }

    pub fn empty(signature: Arc<Signature>) -> Self {
        Self::new(signature, Vec::new(), HashMap::new())
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &HashMap<String, Value> {
        &self.keyword
    }

    /// Value bound to `name`, falling back to the parameter's declared default.
    /// For a variadic parameter this is its first captured value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.signature.position(name)?;
        let param = &self.signature.params()[index];
        let bound = match param.kind {
            ArityKind::Normal | ArityKind::VariadicRest => self.positional.get(index),
            ArityKind::KeywordRest => self.keyword.get(name).filter(|v| !v.is_null()),
        };
        bound.or(param.default.as_ref())
    }

    /// Every value captured by a variadic parameter.
    pub fn rest(&self, name: &str) -> &[Value] {
        match self.signature.position(name) {
            Some(index) if self.signature.params()[index].kind == ArityKind::VariadicRest => {
                &self.positional[index.min(self.positional.len())..]
            }
            _ => &[],
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }
}
