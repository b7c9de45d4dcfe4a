/// Built-in command handlers.
///
/// Opt-in: register [`help_command`] like any other command.
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::command::{Command, CommandHandler, Invocation};
use crate::signature::{Param, Signature};

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// Lists every registered command, or details one command and its subcommands.
pub struct HelpHandler;

fn describe(lines: &mut Vec<String>, prefix: &str, command: &Command, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut line = format!("{indent}• `{prefix}{}`", command.usage());
    if !command.description().is_empty() {
        line.push_str(&format!(" — {}", command.description()));
    }
    if !command.aliases().is_empty() {
        line.push_str(&format!(" (aliases: {})", command.aliases().join(", ")));
    }
    lines.push(line);
}

fn describe_tree(lines: &mut Vec<String>, prefix: &str, command: &Command, depth: usize) {
    describe(lines, prefix, command, depth);
    let nested = format!("{prefix}{} ", command.name());
    for sub in command.subcommands() {
        describe_tree(lines, &nested, sub, depth + 1);
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn call(&self, inv: Invocation) -> Result<()> {
        let ctx = &inv.ctx;
        let registry = &ctx.services().registry;
        let prefix = ctx.prefix().to_string();

        let mut lines = Vec::new();
        match inv.args.str("command") {
            Some(name) => match registry.get(name).await {
                Some(command) => describe_tree(&mut lines, &prefix, &command, 0),
                None => lines.push(format!("❓ No command named `{name}`")),
            },
            None => {
                lines.push("*Available commands:*".to_string());
                for command in registry.commands().await {
                    describe(&mut lines, &prefix, &command, 0);
                }
            }
        }
        ctx.send(lines.join("\n")).await
    }
}

/// The `help [command]` command.
pub fn help_command() -> Command {
    let signature = Signature::new(vec![Param::new("command").optional().describe("Command to describe")])
        .unwrap_or_default();
    Command::new("help", signature, Arc::new(HelpHandler)).describe("Show available commands.")
}
