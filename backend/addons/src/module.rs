//! Statically linked modules with load/unload entry points.
//!
//! A module is registered in the [`ModuleCatalog`] under a dotted path. The
//! bot loads it by calling its `load` entry point, which typically registers
//! addons. Registering a new spec under the same path replaces the code that
//! the next `reload_module` will run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;
use tracing::info;

use crate::bot::Bot;

pub type EntryPoint = Arc<dyn Fn(Bot) -> BoxFuture<'static, Result<()>> + Send + Sync>;

#[derive(Clone)]
pub struct ModuleSpec {
    path: String,
    load: Option<EntryPoint>,
    unload: Option<EntryPoint>,
}

impl ModuleSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), load: None, unload: None }
    }

    pub fn on_load<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.load = Some(Arc::new(move |bot| f(bot).boxed()));
        self
    }

    pub fn on_unload<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Bot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.unload = Some(Arc::new(move |bot| f(bot).boxed()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn load(&self) -> Option<&EntryPoint> {
        self.load.as_ref()
    }

    pub fn unload(&self) -> Option<&EntryPoint> {
        self.unload.as_ref()
    }
}

impl std::fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("path", &self.path)
            .field("load", &self.load.is_some())
            .field("unload", &self.unload.is_some())
            .finish()
    }
}

/// Every module the process knows how to load.
#[derive(Default, Clone)]
pub struct ModuleCatalog {
    modules: Arc<RwLock<HashMap<String, ModuleSpec>>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, replacing any previous spec at the same path.
    pub async fn register(&self, spec: ModuleSpec) {
        let path = spec.path.clone();
        if self.modules.write().await.insert(path.clone(), spec).is_some() {
            info!(module = %path, "Module spec replaced");
        }
    }

    pub async fn get(&self, path: &str) -> Option<ModuleSpec> {
        self.modules.read().await.get(path).cloned()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.modules.read().await.contains_key(path)
    }

    /// Every known path, sorted.
    pub async fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.modules.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }
}
