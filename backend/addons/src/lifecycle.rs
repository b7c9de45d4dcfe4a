//! Addon lifecycle: load and unload sequences around the user hooks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::addon::LoadedAddon;

/// Current state of an addon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonStatus {
    /// Registered, `on_load` not finished yet.
    Loading,
    Active,
    Unloading,
    Unloaded,
    /// `on_load` failed. The addon stays registered.
    Failed,
}

/// Run the load hook of a freshly registered addon.
pub async fn run_load_sequence(addon: &Arc<LoadedAddon>) -> AddonStatus {
    debug!(addon = %addon.name(), "Running load sequence");
    let status = match &addon.on_load {
        Some(hook) => match hook(addon.clone()).await {
            Ok(()) => AddonStatus::Active,
            Err(e) => {
                warn!(addon = %addon.name(), error = %e, "on_load failed");
                AddonStatus::Failed
            }
        },
        None => AddonStatus::Active,
    };
    addon.set_status(status).await;
    if status == AddonStatus::Active {
        info!(addon = %addon.name(), commands = addon.command_names().len(), "Addon loaded");
    }
    status
}

/// Run the unload hook of an addon already removed from the bot.
/// Hook failures are logged; the addon ends up unloaded either way.
pub async fn run_unload_sequence(addon: &Arc<LoadedAddon>) -> AddonStatus {
    debug!(addon = %addon.name(), "Running unload sequence");
    addon.set_status(AddonStatus::Unloading).await;
    if let Some(hook) = &addon.on_unload {
        if let Err(e) = hook(addon.clone()).await {
            warn!(addon = %addon.name(), error = %e, "on_unload failed");
        }
    }
    addon.set_status(AddonStatus::Unloaded).await;
    info!(addon = %addon.name(), "Addon unloaded");
    AddonStatus::Unloaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addon::Addon;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn load_without_hook_is_active() {
        let (addon, _, _) = Addon::new("plain").into_parts();
        assert_eq!(run_load_sequence(&addon).await, AddonStatus::Active);
        assert_eq!(addon.status().await, AddonStatus::Active);
    }

    #[tokio::test]
    async fn failing_load_hook_marks_failed() {
        let (addon, _, _) = Addon::new("broken")
            .on_load(|_| async { Err(anyhow::anyhow!("no database")) })
            .into_parts();
        assert_eq!(run_load_sequence(&addon).await, AddonStatus::Failed);
    }

    #[tokio::test]
    async fn unload_runs_hook_even_when_it_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (addon, _, _) = Addon::new("flaky")
            .on_unload(move |addon| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(addon.status().await, AddonStatus::Unloading);
                    Err(anyhow::anyhow!("cleanup failed"))
                }
            })
            .into_parts();
        assert_eq!(run_unload_sequence(&addon).await, AddonStatus::Unloaded);
        assert_eq!(addon.status().await, AddonStatus::Unloaded);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
