//! `parley check`: report config findings without starting a bot.

use std::path::Path;

use anyhow::{bail, Result};
use parley_config::{apply_all_defaults, validate, BotConfig, ValidationReport};

pub fn run(path: &Path, raw: &BotConfig) -> Result<()> {
    println!("\n🔍 Checking {}\n", path.display());
    if !path.exists() {
        println!("  🟡 File not found, defaults apply");
    }

    let config = apply_all_defaults(raw.clone());
    let report = validate(&config);
    let lines = render(&report);
    if lines.is_empty() {
        println!("  🟢 No findings");
    }
    for line in lines {
        println!("{line}");
    }

    println!();
    if !report.is_valid() {
        bail!("{} config error(s)", report.errors.len());
    }
    println!("✅ Config is valid. Prefixes: {}", config.prefixes().join(" "));
    Ok(())
}

fn render(report: &ValidationReport) -> Vec<String> {
    let warnings = report.warnings.iter().map(|w| format!("  🟡 {}: {}", w.path, w.message));
    let errors = report.errors.iter().map(|e| format!("  🔴 {}: {}", e.path, e.message));
    warnings.chain(errors).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_warnings_before_errors() {
        let config = BotConfig {
            prefixes: Some(vec!["!".into(), "!".into(), String::new()]),
            ..BotConfig::default()
        };
        let lines = render(&validate(&apply_all_defaults(config)));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  🟡 prefixes[1]"));
        assert!(lines[1].starts_with("  🔴 prefixes[2]"));
    }

    #[test]
    fn default_config_is_valid() {
        let path = std::env::temp_dir().join("parley-check-missing.yaml");
        assert!(run(&path, &BotConfig::default()).is_ok());
    }
}
