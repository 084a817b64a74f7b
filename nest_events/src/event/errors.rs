//! Event error types.

use super::models::{EventId, ParticipantId};
use crate::store::StoreError;
use thiserror::Error;

/// Event errors
///
/// Every domain variant is recoverable and meant to be shown to the actor.
#[derive(Debug, Error)]
pub enum EventError {
    /// Event does not exist, or has ended and the operation mutates it
    #[error("Event {0} not found or already ended")]
    NotFound(EventId),

    #[error("Participant {0} is already registered")]
    AlreadyRegistered(ParticipantId),

    #[error("Participant {0} is not registered")]
    NotRegistered(ParticipantId),

    #[error("Event is full ({limit} participants)")]
    Full { limit: u32 },

    #[error("Not enough participants: need 2, have {have}")]
    NotEnoughPlayers { have: usize },

    #[error("Current round is not finished: {pending} match(es) still undecided")]
    RoundInProgress { pending: usize },

    #[error("Tournament is already over{}", champion_suffix(.champion))]
    TournamentComplete { champion: Option<ParticipantId> },

    #[error("No active matches, generate pairings first")]
    NoActiveRound,

    #[error("Participant {0} is not playing in this round")]
    NotPlaying(ParticipantId),

    #[error("Match of participant {participant} is already decided (winner: {winner})")]
    AlreadyDecided {
        participant: ParticipantId,
        winner: ParticipantId,
    },

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

fn champion_suffix(champion: &Option<ParticipantId>) -> String {
    champion
        .map(|id| format!(", winner is {id}"))
        .unwrap_or_default()
}

impl EventError {
    /// Stable machine-readable kind
    pub fn code(&self) -> &'static str {
        match self {
            EventError::NotFound(_) => "not_found",
            EventError::AlreadyRegistered(_) => "already_registered",
            EventError::NotRegistered(_) => "not_registered",
            EventError::Full { .. } => "full",
            EventError::NotEnoughPlayers { .. } => "not_enough_players",
            EventError::RoundInProgress { .. } => "round_in_progress",
            EventError::TournamentComplete { .. } => "tournament_complete",
            EventError::NoActiveRound => "no_active_round",
            EventError::NotPlaying(_) => "not_playing",
            EventError::AlreadyDecided { .. } => "already_decided",
            EventError::Store(_) => "internal",
        }
    }

    /// Whether the error came from user input rather than infrastructure
    pub fn is_domain(&self) -> bool {
        !matches!(self, EventError::Store(_))
    }

    /// Get a client-safe error message
    ///
    /// Store errors are replaced by a generic message so file paths and SQL
    /// details never reach chat.
    pub fn client_message(&self) -> String {
        match self {
            EventError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for event operations
pub type EventResult<T> = Result<T, EventError>;
