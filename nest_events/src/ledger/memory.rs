//! In-memory currency ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CurrencyLedger, LedgerError, LedgerResult};
use crate::event::models::{GuildId, ParticipantId};

/// Process-local balances keyed by guild and member
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: RwLock<HashMap<(GuildId, ParticipantId), i64>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, zero for unknown members
    pub async fn balance(&self, guild_id: GuildId, participant: ParticipantId) -> i64 {
        self.balances
            .read()
            .await
            .get(&(guild_id, participant))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every balance in a guild
    pub async fn total(&self, guild_id: GuildId) -> i64 {
        self.balances
            .read()
            .await
            .iter()
            .filter(|((guild, _), _)| *guild == guild_id)
            .map(|(_, balance)| balance)
            .sum()
    }
}

#[async_trait]
impl CurrencyLedger for MemoryLedger {
    async fn credit(
        &self,
        guild_id: GuildId,
        participant: ParticipantId,
        amount: i64,
    ) -> LedgerResult<i64> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut balances = self.balances.write().await;
        let balance = balances.entry((guild_id, participant)).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }
}
