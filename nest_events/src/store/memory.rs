//! In-memory event store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{EventStore, StoreResult};
use crate::event::models::{Event, GuildId};

/// Process-local store, lost on restart
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    guilds: RwLock<HashMap<GuildId, Vec<Event>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of guilds that have committed at least once
    pub async fn guild_count(&self) -> usize {
        self.guilds.read().await.len()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn load_events(&self, guild_id: GuildId) -> StoreResult<Vec<Event>> {
        Ok(self
            .guilds
            .read()
            .await
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_events(&self, guild_id: GuildId, events: &[Event]) -> StoreResult<()> {
        self.guilds.write().await.insert(guild_id, events.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::models::EventConfig;
    use chrono::Utc;

    #[tokio::test]
    async fn test_unknown_guild_is_empty() {
        let store = MemoryEventStore::new();
        assert!(store.load_events(1).await.unwrap().is_empty());
        assert_eq!(store.guild_count().await, 0);
    }

    #[tokio::test]
    async fn test_guilds_are_isolated() {
        let store = MemoryEventStore::new();
        let event = Event::from_config(1, EventConfig::elimination("Cup", 10), 5, Utc::now());
        store.commit_events(1, &[event.clone()]).await.unwrap();

        assert_eq!(store.load_events(1).await.unwrap(), vec![event]);
        assert!(store.load_events(2).await.unwrap().is_empty());
    }
}
