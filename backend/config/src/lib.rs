//! `parley-config`: bot configuration management.
//!
//! Provides:
//! - Typed config schema (prefixes, owners, conversion policy, modules, logging)
//! - YAML read/write
//! - Default value application
//! - Validation

pub mod defaults;
pub mod io;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use defaults::{apply_all_defaults, DEFAULT_LOG_LEVEL, DEFAULT_PREFIX};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{BotConfig, ConversionConfig, LoggingConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::Result;
use std::path::Path;

/// Load, apply defaults to and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Validation
/// findings are logged; errors fail the load.
pub async fn load_and_prepare(path: &Path) -> Result<BotConfig> {
    prepare(load_config(path).await?)
}

/// Apply defaults to an already loaded config, then validate it.
pub fn prepare(config: BotConfig) -> Result<BotConfig> {
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        return Err(first.into());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_fills_defaults() {
        let config = prepare(BotConfig::default()).unwrap();
        assert_eq!(config.prefixes, Some(vec![DEFAULT_PREFIX.to_string()]));
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn prepare_rejects_invalid_config() {
        let config = BotConfig { prefixes: Some(Vec::new()), ..BotConfig::default() };
        let err = prepare(config).unwrap_err();
        assert!(err.to_string().contains("prefixes"));
    }

    #[tokio::test]
    async fn load_and_prepare_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("parley-config-missing").join("config.yaml");
        let config = load_and_prepare(&path).await.unwrap();
        assert!(config.ignore_bots());
    }
}
