//! Config defaults: fills unset fields of a freshly loaded config.

use crate::schema::{BotConfig, ConversionConfig, LoggingConfig};

pub const DEFAULT_PREFIX: &str = "!";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_dispatch_defaults(config);
    let config = apply_conversion_defaults(config);
    apply_logging_defaults(config)
}

fn apply_dispatch_defaults(mut config: BotConfig) -> BotConfig {
    config.prefixes.get_or_insert_with(|| vec![DEFAULT_PREFIX.to_string()]);
    config.ignore_bots.get_or_insert(true);
    config
}

fn apply_conversion_defaults(mut config: BotConfig) -> BotConfig {
    let conversion = config.conversion.get_or_insert_with(ConversionConfig::default);
    conversion.falsy_falls_through.get_or_insert(true);
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    logging.json.get_or_insert(false);
    config
}
