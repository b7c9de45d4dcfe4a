/// Handler signature descriptors.
///
/// A signature is the declared, ordered parameter list of a command handler.
/// It is validated once at construction; the binder trusts its shape afterwards.
use parley_core::SignatureError;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Arity
// ---------------------------------------------------------------------------

/// How a parameter consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityKind {
    /// Exactly one token.
    Normal,
    /// Every remaining token, each converted separately.
    VariadicRest,
    /// The remaining raw text as a single value, internal spacing intact.
    KeywordRest,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A target type a raw token can be converted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
    Snowflake,
    User,
    Member,
    Channel,
    Role,
    /// A converter registered by name on the converter chain.
    Custom(String),
}

impl ParamType {
    pub fn custom(name: impl Into<String>) -> Self {
        ParamType::Custom(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "bool",
            ParamType::Snowflake => "snowflake",
            ParamType::User => "user",
            ParamType::Member => "member",
            ParamType::Channel => "channel",
            ParamType::Role => "role",
            ParamType::Custom(name) => name,
        }
    }
}

/// A parameter's type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeSpec {
    /// No annotation; the raw string passes through.
    #[default]
    Untyped,
    Single(ParamType),
    /// Candidates tried in declaration order.
    Union(Vec<ParamType>),
}

impl TypeSpec {
    /// Candidate types in the order they should be attempted.
    pub fn candidates(&self) -> Vec<ParamType> {
        match self {
            TypeSpec::Untyped => vec![ParamType::Str],
            TypeSpec::Single(ty) => vec![ty.clone()],
            TypeSpec::Union(types) => types.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TypeSpec::Untyped => "str".to_string(),
            TypeSpec::Single(ty) => ty.name().to_string(),
            TypeSpec::Union(types) => types.iter().map(ParamType::name).collect::<Vec<_>>().join("|"),
        }
    }
}

impl From<ParamType> for TypeSpec {
    fn from(value: ParamType) -> Self {
        TypeSpec::Single(value)
    }
}

// ---------------------------------------------------------------------------
// Param
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub description: String,
    pub ty: TypeSpec,
    pub kind: ArityKind,
    /// Whether the binder must find a token for this parameter.
    pub required: bool,
    pub default: Option<Value>,
}

impl Param {
    /// A required, untyped, single-token parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            ty: TypeSpec::Untyped,
            kind: ArityKind::Normal,
            required: true,
            default: None,
        }
    }

    pub fn typed(mut self, ty: ParamType) -> Self {
        self.ty = TypeSpec::Single(ty);
        self
    }

    pub fn union(mut self, types: impl IntoIterator<Item = ParamType>) -> Self {
        self.ty = TypeSpec::Union(types.into_iter().collect());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Makes the parameter optional with a fallback value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.kind = ArityKind::VariadicRest;
        self
    }

    pub fn keyword_rest(mut self) -> Self {
        self.kind = ArityKind::KeywordRest;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn usage(&self) -> String {
        let inner = match self.kind {
            ArityKind::Normal => self.name.clone(),
            ArityKind::VariadicRest => format!("{}*", self.name),
            ArityKind::KeywordRest => format!("{}...", self.name),
        };
        if self.required {
            format!("<{inner}>")
        } else {
            format!("[{inner}]")
        }
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// The ordered parameter list of a handler, excluding the context parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    /// Validate and build a signature.
    pub fn new(params: Vec<Param>) -> Result<Self, SignatureError> {
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(SignatureError::DuplicateParameter { name: param.name.clone() });
            }
        }

        let keyword_rests = params.iter().filter(|p| p.kind == ArityKind::KeywordRest).count();
        let variadics = params.iter().filter(|p| p.kind == ArityKind::VariadicRest).count();
        if keyword_rests > 1 {
            return Err(SignatureError::MultipleKeywordRest);
        }
        if keyword_rests > 0 && variadics > 0 {
            return Err(SignatureError::MixedRestKinds);
        }

        let last = params.len().saturating_sub(1);
        if let Some((_, rest)) = params
            .iter()
            .enumerate()
            .find(|(i, p)| p.kind != ArityKind::Normal && *i != last)
        {
            return Err(SignatureError::RestNotLast { name: rest.name.clone() });
        }

        Ok(Self { params })
    }

    /// A signature with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn keyword_rest(&self) -> Option<&Param> {
        self.params.iter().find(|p| p.kind == ArityKind::KeywordRest)
    }

    pub fn has_variadic(&self) -> bool {
        self.params.iter().any(|p| p.kind == ArityKind::VariadicRest)
    }

    /// Number of parameters the binder must fill. A variadic tail may
    /// capture nothing, so it never counts.
    pub fn required_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.required && p.kind != ArityKind::VariadicRest)
            .count()
    }

    /// One-line usage string, e.g. `<target> [count] [reason...]`; a variadic
    /// tail renders as `[numbers*]`.
    pub fn usage(&self) -> String {
        self.params.iter().map(Param::usage).collect::<Vec<_>>().join(" ")
    }
}
