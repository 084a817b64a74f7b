//! Durable per-guild event collections.
//!
//! The engine never talks to a database directly. It loads a guild's whole
//! event list through [`EventStore::load_events`], mutates it in memory and
//! writes it back with [`EventStore::commit_events`]. Serializing those two
//! calls per guild is the job of [`crate::event::EventManager`].
//!
//! Three backends are provided:
//! - [`MemoryEventStore`]: process-local, for tests and embedding
//! - [`JsonFileEventStore`]: a single JSON document on disk
//! - [`PgEventStore`]: one JSONB row per guild in PostgreSQL
//!
//! ## Example
//!
//! ```no_run
//! use nest_events::store::{PgEventStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PgEventStore::connect(&StoreConfig::development()).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::event::models::{Event, GuildId};

pub mod config;
pub mod errors;
pub mod json_file;
pub mod memory;
pub mod postgres;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use json_file::JsonFileEventStore;
pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

/// Persistence contract for event collections
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load every event of a guild, oldest first. Unknown guilds yield an empty list.
    async fn load_events(&self, guild_id: GuildId) -> StoreResult<Vec<Event>>;

    /// Replace the stored events of a guild
    async fn commit_events(&self, guild_id: GuildId, events: &[Event]) -> StoreResult<()>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
