//! Config validation with user-friendly error messages.

use crate::schema::BotConfig;
use std::collections::HashSet;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_prefixes(config, &mut report);
    validate_owners(config, &mut report);
    validate_modules(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_prefixes(config: &BotConfig, report: &mut ValidationReport) {
    let Some(prefixes) = &config.prefixes else { return };
    if prefixes.is_empty() {
        report.error("prefixes", "At least one prefix is required; no message can invoke a command");
    }
    let mut seen = HashSet::new();
    for (i, prefix) in prefixes.iter().enumerate() {
        let path = format!("prefixes[{i}]");
        if prefix.is_empty() {
            report.error(&path, "Prefix cannot be empty");
            continue;
        }
        if prefix.trim_end().chars().any(char::is_whitespace) || prefix.starts_with(char::is_whitespace) {
            report.warn(&path, format!("Prefix {prefix:?} contains whitespace"));
        }
        if !seen.insert(prefix.as_str()) {
            report.warn(&path, format!("Duplicate prefix {prefix:?}"));
        }
    }
}

fn validate_owners(config: &BotConfig, report: &mut ValidationReport) {
    if config.owner_ids.contains(&0) {
        report.error("ownerIds", "Owner id 0 is not a valid identifier");
    }
}

fn validate_modules(config: &BotConfig, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for (i, module) in config.modules.iter().enumerate() {
        let path = format!("modules[{i}]");
        if module.trim().is_empty() {
            report.error(&path, "Module path cannot be empty");
        } else if !seen.insert(module.as_str()) {
            report.warn(&path, format!("Module '{module}' is listed twice; the second load will fail"));
        }
    }
}

fn validate_logging(config: &BotConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else { return };
    if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        report.error("logging.level", format!("Unknown log level '{level}'"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LoggingConfig;

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&BotConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_prefix_is_error() {
        let cfg = BotConfig { prefixes: Some(vec!["!".into(), String::new()]), ..Default::default() };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "prefixes[1]");
    }

    #[test]
    fn duplicate_and_spaced_prefixes_warn() {
        let cfg = BotConfig {
            prefixes: Some(vec!["!".into(), "!".into(), "hey bot".into(), "pls ".into()]),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        let paths: Vec<_> = report.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, vec!["prefixes[1]", "prefixes[2]"]);
    }

    #[test]
    fn unknown_log_level_is_error() {
        let cfg = BotConfig {
            logging: Some(LoggingConfig { level: Some("loud".into()), ..Default::default() }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.errors[0].path.contains("logging.level"));
    }

    #[test]
    fn duplicate_modules_warn() {
        let cfg = BotConfig { modules: vec!["a".into(), "a".into()], owner_ids: vec![0], ..Default::default() };
        let report = validate(&cfg);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.errors[0].path, "ownerIds");
    }
}
