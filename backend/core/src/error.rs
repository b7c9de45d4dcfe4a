use thiserror::Error;

/// Failures raised while turning raw argument text into bound, typed values.
///
/// These never reach a handler directly: the dispatcher wraps them into
/// [`CommandError::InvalidArgument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("argument count does not match: expected {expected}, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("empty input")]
    EmptyInput,

    #[error("failed to convert '{value}'")]
    ConversionFailed { value: String },
}

/// A handler's declared parameter list has a shape the binder cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("at most one keyword-only rest parameter is allowed")]
    MultipleKeywordRest,

    #[error("unable to mix variadic and keyword-only rest parameters")]
    MixedRestKinds,

    #[error("rest parameter '{name}' must be the last parameter")]
    RestNotLast { name: String },

    #[error("parameter '{name}' is declared twice")]
    DuplicateParameter { name: String },
}

/// Everything that can go wrong once a command has been resolved for a message.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("parsing argument has failed: {0}")]
    InvalidArgument(#[from] ArgumentError),

    #[error("command check has failed for '{command}'")]
    CheckFailed { command: String },

    #[error("'{given}' is not a subcommand of '{command}'")]
    InvalidSubcommand { command: String, given: String },

    #[error("command handler failed: {0}")]
    Handler(anyhow::Error),
}

/// Registration-time conflicts. Not recoverable by error hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command '{name}' already exists")]
    CommandAlreadyExists { name: String },

    #[error("addon '{name}' is already loaded")]
    AddonAlreadyLoaded { name: String },
}

/// Module lifecycle failures, raised at the load/unload boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    #[error("module '{path}' is already loaded")]
    ModuleAlreadyLoaded { path: String },

    #[error("module '{path}' is not loaded")]
    ModuleNotLoaded { path: String },

    #[error("'{path}' is not a valid module")]
    InvalidModule { path: String },

    #[error("module '{path}' has no load function")]
    MissingLoadFunction { path: String },

    #[error("module '{path}' has no unload function")]
    MissingUnloadFunction { path: String },

    #[error("entry point of module '{path}' failed: {message}")]
    EntryPointFailed { path: String, message: String },
}

/// Top-level error type for the parley runtime.
#[derive(Debug, Error)]
pub enum ParleyError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_wrap_into_invalid_argument() {
        let err: CommandError = ArgumentError::EmptyInput.into();
        assert!(matches!(err, CommandError::InvalidArgument(ArgumentError::EmptyInput)));
        assert_eq!(err.to_string(), "parsing argument has failed: empty input");
    }

    #[test]
    fn invalid_argument_keeps_its_source() {
        use std::error::Error as _;
        let err = CommandError::from(ArgumentError::ConversionFailed { value: "abc".into() });
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("failed to convert 'abc'"));
    }

    #[test]
    fn module_errors_name_the_path() {
        let err = ModuleError::MissingLoadFunction { path: "ext.fun".into() };
        assert_eq!(err.to_string(), "module 'ext.fun' has no load function");
    }
}
