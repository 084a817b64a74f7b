//! Event manager: the transaction boundary around the event engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

use super::{
    errors::{EventError, EventResult},
    lifecycle::{self, FinishOutcome},
    models::{BracketView, Event, EventConfig, EventId, EventSummary, GuildId, ParticipantId},
    pairing::{self, PairingOutcome},
    payout::Payout,
    results::{self, WinOutcome},
    standings::{self, StandingsView},
};
use crate::{ledger::CurrencyLedger, store::EventStore};

/// A payout the ledger accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditedPayout {
    pub payout: Payout,
    pub new_balance: i64,
}

/// A payout the ledger rejected. Not retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPayout {
    pub payout: Payout,
    pub reason: String,
}

/// Outcome of applying payout instructions to the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutReport {
    pub credited: Vec<CreditedPayout>,
    pub failed: Vec<FailedPayout>,
}

impl PayoutReport {
    pub fn is_empty(&self) -> bool {
        self.credited.is_empty() && self.failed.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Total amount actually credited
    pub fn total_credited(&self) -> i64 {
        self.credited.iter().map(|c| c.payout.amount).sum()
    }
}

/// Result of [`EventManager::declare_winner`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinReport {
    pub outcome: WinOutcome,
    /// Empty unless the result completed the tournament
    pub payouts: PayoutReport,
}

/// Result of [`EventManager::finish`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishReport {
    pub outcome: FinishOutcome,
    pub payouts: PayoutReport,
}

/// Serializes event commands per guild and persists their results.
///
/// Every mutating command runs as one transaction: take the guild's lock,
/// load the guild's events, apply the operation, and commit only if it
/// succeeded. Commands for different guilds never wait on each other.
/// Prize credits are applied after the commit and after the lock is
/// released.
///
/// Queries read the last committed snapshot without locking.
pub struct EventManager {
    /// Event persistence
    store: Arc<dyn EventStore>,

    /// Prize disbursement
    ledger: Arc<dyn CurrencyLedger>,

    /// One lock per guild, created on first use
    guild_locks: RwLock<HashMap<GuildId, Arc<Mutex<()>>>>,
}

impl EventManager {
    /// Create a new event manager
    pub fn new(store: Arc<dyn EventStore>, ledger: Arc<dyn CurrencyLedger>) -> Self {
        Self {
            store,
            ledger,
            guild_locks: RwLock::new(HashMap::new()),
        }
    }

    async fn guild_lock(&self, guild_id: GuildId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.guild_locks.read().await.get(&guild_id) {
            return Arc::clone(lock);
        }

        let mut locks = self.guild_locks.write().await;
        Arc::clone(locks.entry(guild_id).or_default())
    }

    /// Run `operation` against a guild's events as one transaction.
    ///
    /// The events are committed only when `operation` returns `Ok`, so a
    /// rejected command leaves the stored state untouched.
    pub async fn transact<T, F>(&self, guild_id: GuildId, operation: F) -> EventResult<T>
    where
        F: FnOnce(&mut Vec<Event>) -> EventResult<T>,
    {
        let lock = self.guild_lock(guild_id).await;
        let _guard = lock.lock().await;

        let mut events = self.store.load_events(guild_id).await?;
        let value = operation(&mut events)?;
        self.store.commit_events(guild_id, &events).await?;

        Ok(value)
    }

    /// Run `operation` against one active event of a guild
    async fn transact_event<T, F>(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        operation: F,
    ) -> EventResult<T>
    where
        F: FnOnce(&mut Event) -> EventResult<T>,
    {
        self.transact(guild_id, |events| {
            operation(lifecycle::find_active_mut(events, event_id)?)
        })
        .await
    }

    /// Create a new event
    pub async fn create_event(
        &self,
        guild_id: GuildId,
        config: EventConfig,
        created_by: ParticipantId,
    ) -> EventResult<Event> {
        let event = self
            .transact(guild_id, |events| {
                Ok(lifecycle::create_event(events, config, created_by, Utc::now()))
            })
            .await?;

        log::info!(
            "Guild {} created event {} '{}' ({}, pool {})",
            guild_id,
            event.id,
            event.name,
            event.format,
            event.prize_pool
        );
        Ok(event)
    }

    /// Register a participant
    pub async fn join(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        participant: ParticipantId,
    ) -> EventResult<EventSummary> {
        let summary = self
            .transact_event(guild_id, event_id, |event| {
                lifecycle::join(event, participant)?;
                Ok(event.summary())
            })
            .await?;

        log::debug!(
            "Participant {} joined event {} in guild {}",
            participant,
            event_id,
            guild_id
        );
        Ok(summary)
    }

    /// Remove a participant
    pub async fn leave(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        participant: ParticipantId,
    ) -> EventResult<EventSummary> {
        let summary = self
            .transact_event(guild_id, event_id, |event| {
                lifecycle::leave(event, participant)?;
                Ok(event.summary())
            })
            .await?;

        log::debug!(
            "Participant {} left event {} in guild {}",
            participant,
            event_id,
            guild_id
        );
        Ok(summary)
    }

    /// Register a participant on an administrator's behalf
    pub async fn add_participant(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        participant: ParticipantId,
    ) -> EventResult<EventSummary> {
        let summary = self
            .transact_event(guild_id, event_id, |event| {
                lifecycle::admin_add_participant(event, participant)?;
                Ok(event.summary())
            })
            .await?;

        log::info!(
            "Participant {} added to event {} in guild {}",
            participant,
            event_id,
            guild_id
        );
        Ok(summary)
    }

    /// Generate the next round.
    ///
    /// Completed events are still looked up so the caller learns who won.
    pub async fn generate_pairings(
        &self,
        guild_id: GuildId,
        event_id: EventId,
    ) -> EventResult<PairingOutcome> {
        let outcome = self
            .transact(guild_id, |events| {
                let event = lifecycle::find_event_mut(events, event_id)?;
                pairing::generate_pairings(event, &mut rand::rng())
            })
            .await?;

        log::info!(
            "Guild {} event {}: paired round {} ({} matches)",
            guild_id,
            event_id,
            outcome.round_number,
            outcome.round.len()
        );
        Ok(outcome)
    }

    /// Record a match winner and pay out if the tournament ended
    pub async fn declare_winner(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        winner: ParticipantId,
    ) -> EventResult<WinReport> {
        let outcome = self
            .transact_event(guild_id, event_id, |event| {
                results::declare_winner(event, winner)
            })
            .await?;

        let payouts = match &outcome.completion {
            Some(completion) => {
                log::info!(
                    "Guild {} event {} '{}' completed, champion {}",
                    guild_id,
                    event_id,
                    completion.event_name,
                    completion.placements.first
                );
                self.disburse(guild_id, event_id, &completion.payouts).await
            }
            None => PayoutReport::default(),
        };

        Ok(WinReport { outcome, payouts })
    }

    /// End an event now and award the whole pool to `winner`
    pub async fn finish(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        winner: ParticipantId,
    ) -> EventResult<FinishReport> {
        let outcome = self
            .transact_event(guild_id, event_id, |event| lifecycle::finish(event, winner))
            .await?;

        log::info!(
            "Guild {} event {} '{}' finished by override, winner {}",
            guild_id,
            event_id,
            outcome.event_name,
            winner
        );

        let payouts = self.disburse(guild_id, event_id, &outcome.payouts).await;
        Ok(FinishReport { outcome, payouts })
    }

    /// Credit every payout once, collecting failures instead of aborting
    async fn disburse(
        &self,
        guild_id: GuildId,
        event_id: EventId,
        payouts: &[Payout],
    ) -> PayoutReport {
        let mut report = PayoutReport::default();

        for &payout in payouts {
            match self
                .ledger
                .credit(guild_id, payout.participant, payout.amount)
                .await
            {
                Ok(new_balance) => report.credited.push(CreditedPayout {
                    payout,
                    new_balance,
                }),
                Err(e) => {
                    log::error!(
                        "Payout of {} to participant {} for event {} in guild {} failed: {}",
                        payout.amount,
                        payout.participant,
                        event_id,
                        guild_id,
                        e
                    );
                    report.failed.push(FailedPayout {
                        payout,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Active events of a guild, oldest first
    pub async fn list_events(&self, guild_id: GuildId) -> EventResult<Vec<EventSummary>> {
        let events = self.store.load_events(guild_id).await?;
        Ok(events
            .iter()
            .filter(|e| e.is_active())
            .map(Event::summary)
            .collect())
    }

    /// Full state of one event, finished or not
    pub async fn get_event(&self, guild_id: GuildId, event_id: EventId) -> EventResult<Event> {
        let events = self.store.load_events(guild_id).await?;
        lifecycle::find_event(&events, event_id).cloned()
    }

    /// Current (or final) round of an event
    pub async fn bracket(&self, guild_id: GuildId, event_id: EventId) -> EventResult<BracketView> {
        let event = self.get_event(guild_id, event_id).await?;
        let round = event.current_round().ok_or(EventError::NoActiveRound)?;

        Ok(BracketView {
            event_id: event.id,
            event_name: event.name.clone(),
            format: event.format,
            match_length: event.match_length,
            round_number: event.round_number(),
            matches: round.matches().to_vec(),
            active: event.is_active(),
        })
    }

    /// Standings of an event, finished or not
    pub async fn standings(
        &self,
        guild_id: GuildId,
        event_id: EventId,
    ) -> EventResult<StandingsView> {
        let event = self.get_event(guild_id, event_id).await?;
        Ok(standings::standings_view(&event))
    }

    /// Check that the store is reachable
    pub async fn health_check(&self) -> EventResult<()> {
        Ok(self.store.health_check().await?)
    }
}
