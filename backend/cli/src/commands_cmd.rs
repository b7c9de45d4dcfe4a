//! `parley commands`: print the command tree of a freshly built console bot.

use std::sync::Arc;

use anyhow::Result;
use parley_addons::Bot;
use parley_commands::Command;
use parley_config::{prepare, BotConfig};
use parley_core::LogReplies;

use crate::demo;

pub async fn run(raw: BotConfig) -> Result<()> {
    let config = prepare(raw)?;
    let bot = demo::console_bot(&config, Arc::new(LogReplies)).await?;
    for line in command_lines(&bot).await {
        println!("{line}");
    }
    Ok(())
}

async fn command_lines(bot: &Bot) -> Vec<String> {
    let mut lines = Vec::new();
    for command in bot.registry().commands().await {
        let owner = command.owner_name().unwrap_or("bot").to_string();
        describe(&mut lines, &command, "", &owner, 0);
    }
    lines
}

fn describe(lines: &mut Vec<String>, command: &Command, parent: &str, owner: &str, depth: usize) {
    let mut line = format!("{}{parent}{}", "  ".repeat(depth), command.usage());
    if depth == 0 {
        line.push_str(&format!("  [{owner}]"));
    }
    if !command.aliases().is_empty() {
        line.push_str(&format!("  (aliases: {})", command.aliases().join(", ")));
    }
    if !command.description().is_empty() {
        line.push_str(&format!("  {}", command.description()));
    }
    lines.push(line);

    let nested = format!("{parent}{} ", command.name());
    for sub in command.subcommands() {
        describe(lines, sub, &nested, owner, depth + 1);
    }
}
