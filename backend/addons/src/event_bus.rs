//! Event Bus
//!
//! Routes bot events to the listeners registered for them, keyed by
//! normalized event name.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::{join_all, BoxFuture};
use parley_commands::Context;
use parley_core::{CommandError, GatewayEvent};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::addon::LoadedAddon;

/// Event name under which unhandled command failures are published.
pub const COMMAND_ERROR: &str = "COMMAND_ERROR";

pub type ListenerFn = Arc<dyn Fn(Option<Arc<LoadedAddon>>, BotEvent) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Everything a listener can receive.
#[derive(Debug, Clone)]
pub enum BotEvent {
    Gateway(GatewayEvent),
    /// A command failed and no error hook handled it.
    CommandError { context: Context, error: Arc<CommandError> },
}

impl BotEvent {
    pub fn name(&self) -> String {
        match self {
            BotEvent::Gateway(event) => event.name(),
            BotEvent::CommandError { .. } => COMMAND_ERROR.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone)]
struct Subscription {
    id: ListenerId,
    addon: Option<Arc<LoadedAddon>>,
    handler: ListenerFn,
}

impl Subscription {
    fn owned_by(&self, addon: &str) -> bool {
        self.addon.as_ref().is_some_and(|a| a.name() == addon)
    }
}

#[derive(Default, Clone)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `event` must already be normalized.
    pub async fn subscribe(&self, event: &str, addon: Option<Arc<LoadedAddon>>, handler: ListenerFn) -> ListenerId {
        let id = ListenerId::new();
        debug!(event, addon = ?addon.as_ref().map(|a| a.name().to_string()), "Listener subscribed");
        self.listeners
            .write()
            .await
            .entry(event.to_string())
            .or_default()
            .push(Subscription { id, addon, handler });
        id
    }

    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().await;
        let mut removed = false;
        for subs in listeners.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.id != id);
            removed |= subs.len() != before;
        }
        listeners.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Drop every listener an addon registered. Returns how many were removed.
    pub async fn unsubscribe_addon(&self, addon: &str) -> usize {
        let mut listeners = self.listeners.write().await;
        let mut removed = 0;
        for subs in listeners.values_mut() {
            let before = subs.len();
            subs.retain(|s| !s.owned_by(addon));
            removed += before - subs.len();
        }
        listeners.retain(|_, subs| !subs.is_empty());
        removed
    }

    pub async fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event).await > 0
    }

    pub async fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().await.get(event).map_or(0, Vec::len)
    }

    /// Run every listener for the event concurrently and wait for all of them.
    /// Listener errors are logged, never propagated. Returns how many ran.
    pub async fn publish(&self, event: BotEvent) -> usize {
        let name = event.name();
        // Snapshot so listeners may (un)subscribe without deadlocking.
        let subs = match self.listeners.read().await.get(&name) {
            Some(subs) => subs.clone(),
            None => return 0,
        };

        let runs = subs.iter().map(|sub| {
            let fut = (sub.handler)(sub.addon.clone(), event.clone());
            let addon = sub.addon.as_ref().map(|a| a.name().to_string());
            let name = name.as_str();
            async move {
                if let Err(e) = fut.await {
                    warn!(event = %name, addon = ?addon, error = %e, "Listener failed");
                }
            }
        });
        join_all(runs).await;
        subs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::{Addon, Listener};
    use std::sync::Mutex;

    fn recording(seen: &Arc<Mutex<Vec<String>>>, tag: &str) -> ListenerFn {
        let seen = seen.clone();
        let tag = tag.to_string();
        Listener::on("any", move |addon, event| {
            let seen = seen.clone();
            let tag = tag.clone();
            async move {
                let owner = addon.map(|a| a.name().to_string()).unwrap_or_default();
                seen.lock().unwrap().push(format!("{tag}:{owner}:{}", event.name()));
                anyhow::Ok(())
            }
        })
        .handler()
    }

    #[tokio::test]
    async fn publishes_to_matching_listeners() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (addon, _, _) = Addon::new("greeter").into_parts();
        bus.subscribe("READY", Some(addon), recording(&seen, "a")).await;
        bus.subscribe("READY", None, recording(&seen, "b")).await;
        bus.subscribe("MESSAGE_CREATE", None, recording(&seen, "c")).await;

        assert_eq!(bus.publish(BotEvent::Gateway(GatewayEvent::Ready)).await, 2);
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["a:greeter:READY", "b::READY"]);
    }

    #[tokio::test]
    async fn failing_listener_does_not_stop_others() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let failing = Listener::on("ready", |_, _| async { Err(anyhow::anyhow!("boom")) });
        bus.subscribe("READY", None, failing.handler()).await;
        bus.subscribe("READY", None, recording(&seen, "ok")).await;
        bus.publish(BotEvent::Gateway(GatewayEvent::Ready)).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_by_id_and_addon() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (addon, _, _) = Addon::new("greeter").into_parts();
        let id = bus.subscribe("READY", None, recording(&seen, "a")).await;
        bus.subscribe("READY", Some(addon.clone()), recording(&seen, "b")).await;
        bus.subscribe(COMMAND_ERROR, Some(addon), recording(&seen, "c")).await;

        assert!(bus.unsubscribe(id).await);
        assert!(!bus.unsubscribe(id).await);
        assert_eq!(bus.unsubscribe_addon("greeter").await, 2);
        assert!(!bus.has_listeners("READY").await);
        assert!(!bus.has_listeners(COMMAND_ERROR).await);
        assert_eq!(bus.publish(BotEvent::Gateway(GatewayEvent::Ready)).await, 0);
    }
}
