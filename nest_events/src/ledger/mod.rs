//! Currency ledger contract used to disburse prizes.
//!
//! The engine never moves coins itself. When an event completes it returns
//! [`crate::event::Payout`] instructions, and [`crate::event::EventManager`]
//! credits them through a [`CurrencyLedger`] after the event state has been
//! committed.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::models::{GuildId, ParticipantId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Ledger refused or could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// External virtual-currency service
#[async_trait]
pub trait CurrencyLedger: Send + Sync {
    /// Add `amount` to a member's balance and return the new balance
    async fn credit(
        &self,
        guild_id: GuildId,
        participant: ParticipantId,
        amount: i64,
    ) -> LedgerResult<i64>;
}
