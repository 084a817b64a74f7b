//! PostgreSQL event store.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};

use super::{EventStore, StoreConfig, StoreResult};
use crate::event::models::{Event, GuildId};

/// Store keeping each guild's events as one JSONB document
#[derive(Clone)]
pub struct PgEventStore {
    pool: Arc<PgPool>,
}

impl PgEventStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Open a connection pool and wrap it
    pub async fn connect(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        Ok(Self::new(Arc::new(connect_pool(config).await?)))
    }

    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Create the backing table if it does not exist
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_events (
                guild_id BIGINT PRIMARY KEY,
                events JSONB NOT NULL DEFAULT '[]'::jsonb,
                updated_at TIMESTAMP NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

/// Build a PostgreSQL pool from configuration
pub async fn connect_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.database_url)
        .await
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn load_events(&self, guild_id: GuildId) -> StoreResult<Vec<Event>> {
        let row = sqlx::query("SELECT events FROM guild_events WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => Ok(serde_json::from_value(row.get("events"))?),
            None => Ok(Vec::new()),
        }
    }

    async fn commit_events(&self, guild_id: GuildId, events: &[Event]) -> StoreResult<()> {
        let events_json = serde_json::to_value(events)?;

        sqlx::query(
            r#"
            INSERT INTO guild_events (guild_id, events, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (guild_id)
            DO UPDATE SET events = EXCLUDED.events, updated_at = NOW()
            "#,
        )
        .bind(guild_id)
        .bind(events_json)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
