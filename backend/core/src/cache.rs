//! In-process entity cache keyed by scope and kind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entity::{Entity, EntityKind};
use crate::traits::{CacheScope, EntityCache};

type Containers = HashMap<CacheScope, HashMap<EntityKind, Vec<Entity>>>;

#[derive(Default, Clone)]
pub struct InMemoryEntityCache {
    containers: Arc<RwLock<Containers>>,
}

impl InMemoryEntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace (by id) an entity in `scope`.
    pub async fn insert(&self, scope: CacheScope, entity: Entity) {
        let mut containers = self.containers.write().await;
        let bucket = containers.entry(scope).or_default().entry(entity.kind()).or_default();
        match bucket.iter_mut().find(|e| e.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => bucket.push(entity),
        }
    }

    pub async fn clear(&self) {
        self.containers.write().await.clear();
    }
}

#[async_trait]
impl EntityCache for InMemoryEntityCache {
    async fn entities(&self, kind: EntityKind, scope: CacheScope) -> Vec<Entity> {
        let containers = self.containers.read().await;
        containers
            .get(&scope)
            .and_then(|kinds| kinds.get(&kind))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Member, Snowflake, User};

    #[tokio::test]
    async fn scopes_are_separate() {
        let cache = InMemoryEntityCache::new();
        cache.insert(CacheScope::Global, Entity::User(User::new(1, "alice"))).await;
        cache
            .insert(CacheScope::Guild(Snowflake(9)), Entity::Member(Member::new(User::new(1, "alice"), 9)))
            .await;

        assert_eq!(cache.entities(EntityKind::User, CacheScope::Global).await.len(), 1);
        assert!(cache.entities(EntityKind::Member, CacheScope::Global).await.is_empty());
        assert_eq!(cache.entities(EntityKind::Member, CacheScope::Guild(Snowflake(9))).await.len(), 1);
    }

    #[tokio::test]
    async fn insert_replaces_same_id() {
        let cache = InMemoryEntityCache::new();
        cache.insert(CacheScope::Global, Entity::User(User::new(1, "old"))).await;
        cache.insert(CacheScope::Global, Entity::User(User::new(1, "new"))).await;
        let users = cache.entities(EntityKind::User, CacheScope::Global).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].as_user().map(|u| u.username.as_str()), Some("new"));
    }
}
