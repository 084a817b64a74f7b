//! Event store backed by a single JSON document.
//!
//! Layout on disk:
//!
//! ```json
//! { "events": { "<guild_id>": [ { "id": 1, "name": "...", ... } ] } }
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place so a
//! crash mid-write never leaves a truncated document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::sync::Mutex;

use super::{EventStore, StoreResult};
use crate::event::models::{Event, GuildId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventDocument {
    #[serde(default)]
    events: BTreeMap<GuildId, Vec<Event>>,
}

/// JSON file store
pub struct JsonFileEventStore {
    path: PathBuf,
    /// Serializes whole-document rewrites across guilds
    write_lock: Mutex<()>,
}

impl JsonFileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> StoreResult<EventDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(EventDocument::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(EventDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &EventDocument) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for JsonFileEventStore {
    async fn load_events(&self, guild_id: GuildId) -> StoreResult<Vec<Event>> {
        let mut document = self.read_document().await?;
        Ok(document.events.remove(&guild_id).unwrap_or_default())
    }

    async fn commit_events(&self, guild_id: GuildId, events: &[Event]) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.read_document().await?;
        document.events.insert(guild_id, events.to_vec());
        self.write_document(&document).await?;

        log::debug!(
            "Committed {} event(s) for guild {} to {}",
            events.len(),
            guild_id,
            self.path.display()
        );
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.read_document().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::models::EventConfig;
    use crate::store::StoreError;
    use chrono::Utc;

    fn sample_event(id: i64) -> Event {
        Event::from_config(id, EventConfig::swiss("League", 100, 3), 1, Utc::now())
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileEventStore::new(dir.path().join("events.json"));

        assert!(store.load_events(7).await.unwrap().is_empty());
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_keeps_other_guilds() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileEventStore::new(dir.path().join("data").join("events.json"));

        store.commit_events(1, &[sample_event(1)]).await.unwrap();
        store
            .commit_events(2, &[sample_event(1), sample_event(2)])
            .await
            .unwrap();

        assert_eq!(store.load_events(1).await.unwrap().len(), 1);
        assert_eq!(store.load_events(2).await.unwrap().len(), 2);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["events"]["1"].is_array());
        assert!(!dir.path().join("data").join("events.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileEventStore::new(path);
        let err = store.load_events(1).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
