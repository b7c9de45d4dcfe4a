//! Bot configuration schema, typed for serde YAML deserialization.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration of a parley bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Static command prefixes, tried in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,

    /// Users treated as bot owners. When empty, owners are looked up remotely.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_ids: Vec<u64>,

    /// Drop messages authored by bot accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_bots: Option<bool>,

    /// Argument conversion policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionConfig>,

    /// Module paths loaded at startup, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl BotConfig {
    pub fn prefixes(&self) -> Vec<String> {
        self.prefixes
            .clone()
            .unwrap_or_else(|| vec![crate::defaults::DEFAULT_PREFIX.to_string()])
    }

    pub fn ignore_bots(&self) -> bool {
        self.ignore_bots.unwrap_or(true)
    }

    pub fn falsy_falls_through(&self) -> bool {
        self.conversion
            .as_ref()
            .and_then(|c| c.falsy_falls_through)
            .unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(crate::defaults::DEFAULT_LOG_LEVEL)
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    /// A falsy conversion result (`0`, `""`, `false`) counts as a miss and
    /// the next candidate type is tried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub falsy_falls_through: Option<bool>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling log file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Emit JSON on the console as well as in the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}
