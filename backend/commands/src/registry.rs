/// Live command registry: canonical names plus a single global alias table.
///
/// Both maps sit behind one lock so a lookup never observes a command
/// without its aliases or the reverse.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parley_core::RegistryError;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::command::Command;

#[derive(Default)]
struct RegistryState {
    commands: HashMap<String, Arc<Command>>,
    /// alias → canonical name
    aliases: HashMap<String, String>,
}

impl RegistryState {
    fn is_taken(&self, name: &str) -> bool {
        self.commands.contains_key(name) || self.aliases.contains_key(name)
    }

    fn remove(&mut self, name: &str) -> Option<Arc<Command>> {
        let removed = self.commands.remove(name)?;
        self.aliases.retain(|_, target| target != name);
        Some(removed)
    }
}

#[derive(Default, Clone)]
pub struct CommandRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one command with all its aliases, or nothing at all.
    pub async fn add_command(&self, command: Command) -> Result<(), RegistryError> {
        self.add_commands(vec![command]).await
    }

    /// Register a batch atomically: any name or alias collision (with the
    /// registry or within the batch) rejects the whole batch.
    pub async fn add_commands(&self, commands: Vec<Command>) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;

        let mut claimed = HashSet::new();
        for command in &commands {
            for name in std::iter::once(command.name()).chain(command.aliases().iter().map(String::as_str)) {
                if state.is_taken(name) || !claimed.insert(name) {
                    return Err(RegistryError::CommandAlreadyExists { name: name.to_string() });
                }
            }
        }

        for command in commands {
            let name = command.name().to_string();
            for alias in command.aliases() {
                state.aliases.insert(alias.clone(), name.clone());
            }
            info!(command = %name, aliases = ?command.aliases(), addon = ?command.owner_name(), "Command registered");
            state.commands.insert(name, Arc::new(command));
        }
        Ok(())
    }

    /// Remove a command and every alias pointing at it. No-op when absent.
    pub async fn remove_command(&self, name: &str) -> Option<Arc<Command>> {
        let removed = self.state.write().await.remove(name);
        if removed.is_some() {
            info!(command = %name, "Command removed");
        }
        removed
    }

    /// Remove several commands under one write lock.
    pub async fn remove_commands<S: AsRef<str>>(&self, names: &[S]) -> Vec<Arc<Command>> {
        let mut state = self.state.write().await;
        let removed: Vec<_> = names.iter().filter_map(|n| state.remove(n.as_ref())).collect();
        debug!(count = removed.len(), "Commands removed");
        removed
    }

    /// Exact name first, then the alias table. Case-sensitive.
    pub async fn get(&self, name: &str) -> Option<Arc<Command>> {
        let state = self.state.read().await;
        state.commands.get(name).cloned().or_else(|| {
            state
                .aliases
                .get(name)
                .and_then(|canonical| state.commands.get(canonical))
                .cloned()
        })
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.state.read().await.is_taken(name)
    }

    /// Every command, sorted by name.
    pub async fn commands(&self) -> Vec<Arc<Command>> {
        let state = self.state.read().await;
        let mut commands: Vec<_> = state.commands.values().cloned().collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.commands.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handler_fn;
    use crate::signature::Signature;

    fn cmd(name: &str) -> Command {
        Command::new(name, Signature::empty(), handler_fn(|_| async { anyhow::Ok(()) }))
    }

    #[tokio::test]
    async fn lookup_by_name_then_alias() {
        let registry = CommandRegistry::new();
        registry.add_command(cmd("ping").alias("p")).await.unwrap();
        assert_eq!(registry.get("ping").await.map(|c| c.name().to_string()), Some("ping".into()));
        assert_eq!(registry.get("p").await.map(|c| c.name().to_string()), Some("ping".into()));
        assert!(registry.get("PING").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let registry = CommandRegistry::new();
        registry.add_command(cmd("ping")).await.unwrap();
        let err = registry.add_command(cmd("ping")).await.unwrap_err();
        assert_eq!(err, RegistryError::CommandAlreadyExists { name: "ping".into() });
    }

    #[tokio::test]
    async fn alias_collision_leaves_registry_unchanged() {
        let registry = CommandRegistry::new();
        registry.add_command(cmd("ping").alias("p")).await.unwrap();

        let err = registry.add_command(cmd("pong").alias("po").alias("p")).await.unwrap_err();
        assert_eq!(err, RegistryError::CommandAlreadyExists { name: "p".into() });
        assert!(registry.get("pong").await.is_none());
        assert!(registry.get("po").await.is_none());
        assert_eq!(registry.len().await, 1);

        // A name may not shadow an existing alias either.
        assert!(registry.add_command(cmd("p")).await.is_err());
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let registry = CommandRegistry::new();
        let err = registry
            .add_commands(vec![cmd("a"), cmd("b").alias("x"), cmd("c").alias("x")])
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::CommandAlreadyExists { name: "x".into() });
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_drops_aliases() {
        let registry = CommandRegistry::new();
        registry.add_command(cmd("ping").alias("p")).await.unwrap();
        assert!(registry.remove_command("ping").await.is_some());
        assert!(registry.get("p").await.is_none());
        assert!(!registry.contains("p").await);
        assert!(registry.remove_command("ping").await.is_none());

        registry.add_command(cmd("pong").alias("p")).await.unwrap();
        assert_eq!(registry.get("p").await.map(|c| c.name().to_string()), Some("pong".into()));
    }

    #[tokio::test]
    async fn commands_are_sorted() {
        let registry = CommandRegistry::new();
        registry.add_commands(vec![cmd("b"), cmd("a"), cmd("c")]).await.unwrap();
        let names: Vec<_> = registry.commands().await.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        registry.remove_commands(&["a", "c", "missing"]).await;
        assert_eq!(registry.len().await, 1);
    }
}
