//! Event module for community tournaments.
//!
//! This module provides:
//! - Event creation, registration and the admin finish override
//! - Round pairing for single elimination and Swiss events
//! - Match result recording with round and tournament completion
//! - Score + Buchholz standings
//! - Podium placements and prize split
//! - [`EventManager`], which runs each command as a per-guild transaction
//!
//! The functions in [`lifecycle`], [`pairing`], [`results`], [`standings`]
//! and [`payout`] are pure: they borrow one `&mut Event` and never touch
//! storage or the ledger.
//!
//! ## Example
//!
//! ```no_run
//! use nest_events::event::{EventConfig, EventManager};
//! use nest_events::ledger::MemoryLedger;
//! use nest_events::store::MemoryEventStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = EventManager::new(
//!         Arc::new(MemoryEventStore::new()),
//!         Arc::new(MemoryLedger::new()),
//!     );
//!
//!     let guild = 1;
//!     let event = manager
//!         .create_event(guild, EventConfig::elimination("Friday Cup", 500), 100)
//!         .await?;
//!     for member in [11, 12, 13, 14] {
//!         manager.join(guild, event.id, member).await?;
//!     }
//!
//!     let round = manager.generate_pairings(guild, event.id).await?;
//!     println!("Round {}: {} matches", round.round_number, round.round.len());
//!
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod lifecycle;
pub mod manager;
pub mod models;
pub mod pairing;
pub mod payout;
pub mod results;
pub mod standings;

pub use errors::{EventError, EventResult};
pub use lifecycle::FinishOutcome;
pub use manager::{
    CreditedPayout, EventManager, FailedPayout, FinishReport, PayoutReport, WinReport,
};
pub use models::{
    BracketView, ChannelId, Event, EventConfig, EventFormat, EventId, EventStatus, EventSummary,
    GuildId, InvalidMatchLength, Match, MatchLength, ParticipantId, Round,
};
pub use pairing::PairingOutcome;
pub use payout::{Payout, Place, Placements, PrizeSplit};
pub use results::{Completion, WinOutcome};
pub use standings::{Standing, StandingsView};
