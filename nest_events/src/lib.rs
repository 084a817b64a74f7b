//! # Nest Events
//!
//! Tournament engine for community chat bots: single elimination and Swiss
//! system events among a guild's members.
//!
//! The engine keeps each guild's events as one collection. A command loads
//! the collection, applies one operation to one event and commits the
//! result; commands for the same guild are serialized, commands for
//! different guilds run independently.
//!
//! ## Core Modules
//!
//! - [`event`]: Models, lifecycle, pairing, results, standings, payouts and
//!   the transactional [`EventManager`]
//! - [`store`]: The [`EventStore`] contract with in-memory, JSON file and
//!   PostgreSQL backends
//! - [`ledger`]: The [`CurrencyLedger`] contract used to credit prizes
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use nest_events::event::{EventConfig, lifecycle, pairing};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut events = Vec::new();
//! let mut event = lifecycle::create_event(
//!     &mut events,
//!     EventConfig::swiss("Weekly League", 100, 3),
//!     1,
//!     Utc::now(),
//! );
//! for member in [10, 11, 12] {
//!     lifecycle::join(&mut event, member).unwrap();
//! }
//!
//! let outcome = pairing::generate_pairings(&mut event, &mut StdRng::seed_from_u64(7)).unwrap();
//! assert_eq!(outcome.round.len(), 2);
//! assert!(outcome.round.matches()[1].is_bye());
//! ```

/// Event models, pure operations and the transactional manager.
pub mod event;
pub use event::{
    Event, EventConfig, EventError, EventFormat, EventId, EventManager, EventResult, GuildId,
    ParticipantId,
};

/// Currency ledger contract and adapters.
pub mod ledger;
pub use ledger::{CurrencyLedger, LedgerError, LedgerResult};

/// Event persistence contract and backends.
pub mod store;
pub use store::{EventStore, StoreConfig, StoreError, StoreResult};
