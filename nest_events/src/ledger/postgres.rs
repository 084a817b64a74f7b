//! PostgreSQL adapter for the guild currency ledger.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use super::{CurrencyLedger, LedgerError, LedgerResult};
use crate::event::models::{GuildId, ParticipantId};

/// Credits balances in the shared `guild_balances` table
#[derive(Clone)]
pub struct PgLedger {
    pool: Arc<PgPool>,
}

impl PgLedger {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create the balances table if it does not exist.
    ///
    /// An existing table, owned by the ledger service, is left as it is.
    pub async fn migrate(&self) -> LedgerResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_balances (
                guild_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
                updated_at TIMESTAMP NOT NULL DEFAULT NOW(),
                PRIMARY KEY (guild_id, user_id)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CurrencyLedger for PgLedger {
    async fn credit(
        &self,
        guild_id: GuildId,
        participant: ParticipantId,
        amount: i64,
    ) -> LedgerResult<i64> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        // Upsert so first-time winners get a row
        let row = sqlx::query(
            r#"
            INSERT INTO guild_balances (guild_id, user_id, balance, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (guild_id, user_id)
            DO UPDATE SET balance = guild_balances.balance + EXCLUDED.balance, updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(guild_id)
        .bind(participant)
        .bind(amount)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.get("balance"))
    }
}
