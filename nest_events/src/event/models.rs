//! Event data models for elimination and Swiss tournaments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Event ID type, unique within a guild
pub type EventId = i64;

/// Participant (community member) ID type
pub type ParticipantId = i64;

/// Community (guild) ID type
pub type GuildId = i64;

/// Announcement channel ID type
pub type ChannelId = i64;

/// Tournament format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFormat {
    /// Single elimination bracket
    Elimination,
    /// Fixed number of rounds paired by running score
    Swiss,
}

impl std::fmt::Display for EventFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFormat::Elimination => write!(f, "Single Elimination"),
            EventFormat::Swiss => write!(f, "Swiss System"),
        }
    }
}

/// Best-of value for a single match. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MatchLength {
    #[default]
    Bo1,
    Bo3,
    Bo5,
}

impl MatchLength {
    /// Number of games the match is played over
    pub fn games(self) -> u8 {
        match self {
            MatchLength::Bo1 => 1,
            MatchLength::Bo3 => 3,
            MatchLength::Bo5 => 5,
        }
    }
}

/// Rejected best-of value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Best-of must be 1, 3 or 5, got {0}")]
pub struct InvalidMatchLength(pub u8);

impl TryFrom<u8> for MatchLength {
    type Error = InvalidMatchLength;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MatchLength::Bo1),
            3 => Ok(MatchLength::Bo3),
            5 => Ok(MatchLength::Bo5),
            other => Err(InvalidMatchLength(other)),
        }
    }
}

impl From<MatchLength> for u8 {
    fn from(length: MatchLength) -> Self {
        length.games()
    }
}

/// A single pairing within a round.
///
/// A bye has no `player2` and is created already won by `player1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub player1: ParticipantId,
    pub player2: Option<ParticipantId>,
    pub winner: Option<ParticipantId>,
}

impl Match {
    /// Create an undecided match between two players
    pub fn new(player1: ParticipantId, player2: ParticipantId) -> Self {
        Self {
            player1,
            player2: Some(player2),
            winner: None,
        }
    }

    /// Create an automatic-advance match for an unpaired player
    pub fn bye(player: ParticipantId) -> Self {
        Self {
            player1: player,
            player2: None,
            winner: Some(player),
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Whether `participant` plays on either side of this match
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.player1 == participant || self.player2 == Some(participant)
    }

    /// The other side of the match, `None` for a bye or a non-member
    pub fn opponent_of(&self, participant: ParticipantId) -> Option<ParticipantId> {
        if self.player1 == participant {
            self.player2
        } else if self.player2 == Some(participant) {
            Some(self.player1)
        } else {
            None
        }
    }

    /// Loser of a decided, non-bye match
    pub fn loser(&self) -> Option<ParticipantId> {
        self.winner.and_then(|winner| self.opponent_of(winner))
    }
}

/// One batch of matches played concurrently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round {
    matches: Vec<Match>,
}

impl Round {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub(crate) fn matches_mut(&mut self) -> &mut [Match] {
        &mut self.matches
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of matches still waiting for a winner
    pub fn pending(&self) -> usize {
        self.matches.iter().filter(|m| !m.is_decided()).count()
    }

    /// True once every match has a winner
    pub fn is_decided(&self) -> bool {
        self.pending() == 0
    }

    /// Winners in match order; byes count as winners
    pub fn winners(&self) -> Vec<ParticipantId> {
        self.matches.iter().filter_map(|m| m.winner).collect()
    }

    /// Losers of every decided, non-bye match
    pub fn losers(&self) -> Vec<ParticipantId> {
        self.matches.iter().filter_map(Match::loser).collect()
    }
}

impl<'a> IntoIterator for &'a Round {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Where an event is in its lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventStatus {
    /// Open for registration, no round paired yet
    #[default]
    Forming,
    /// A round has been paired. It may already be fully decided and waiting
    /// for the next pairing call to archive it.
    InRound { round: Round },
    /// Terminal. Keeps the last round for bracket and standings queries.
    Completed {
        final_round: Option<Round>,
        champion: Option<ParticipantId>,
    },
}

/// Settings supplied when an event is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    pub name: String,
    pub prize_pool: i64,
    pub format: EventFormat,
    /// Free-text schedule such as "Friday 20:00"
    pub scheduled_label: Option<String>,
    /// Maximum roster size, 0 for unlimited
    pub participant_limit: u32,
    /// Number of rounds for Swiss events
    pub total_rounds: u32,
    pub match_length: MatchLength,
    pub announce_channel: Option<ChannelId>,
}

impl EventConfig {
    /// Default round count for Swiss events
    pub const DEFAULT_ROUNDS: u32 = 3;

    pub fn new(name: impl Into<String>, prize_pool: i64, format: EventFormat) -> Self {
        Self {
            name: name.into(),
            prize_pool,
            format,
            scheduled_label: None,
            participant_limit: 0,
            total_rounds: Self::DEFAULT_ROUNDS,
            match_length: MatchLength::default(),
            announce_channel: None,
        }
    }

    /// Create a single elimination configuration
    pub fn elimination(name: impl Into<String>, prize_pool: i64) -> Self {
        Self::new(name, prize_pool, EventFormat::Elimination)
    }

    /// Create a Swiss configuration with a fixed number of rounds
    pub fn swiss(name: impl Into<String>, prize_pool: i64, total_rounds: u32) -> Self {
        Self::new(name, prize_pool, EventFormat::Swiss).with_rounds(total_rounds)
    }

    pub fn with_limit(mut self, participant_limit: u32) -> Self {
        self.participant_limit = participant_limit;
        self
    }

    /// Round count, clamped to at least one
    pub fn with_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = total_rounds.max(1);
        self
    }

    pub fn with_match_length(mut self, match_length: MatchLength) -> Self {
        self.match_length = match_length;
        self
    }

    pub fn with_schedule(mut self, label: impl Into<String>) -> Self {
        self.scheduled_label = Some(label.into());
        self
    }

    pub fn with_announce_channel(mut self, channel: ChannelId) -> Self {
        self.announce_channel = Some(channel);
        self
    }
}

/// One tournament within a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub prize_pool: i64,
    pub format: EventFormat,
    pub scheduled_label: String,
    pub participant_limit: u32,
    pub total_rounds: u32,
    pub match_length: MatchLength,
    /// Roster in join order
    pub participants: Vec<ParticipantId>,
    /// Swiss points; missing entries count as zero
    #[serde(default)]
    pub scores: BTreeMap<ParticipantId, i64>,
    /// Elimination players still alive, `None` until the first pairing
    #[serde(default)]
    pub surviving: Option<Vec<ParticipantId>>,
    /// Completed rounds, oldest first
    #[serde(default)]
    pub round_history: Vec<Round>,
    #[serde(default)]
    pub status: EventStatus,
    pub created_by: ParticipantId,
    pub announce_channel: Option<ChannelId>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Label used when no schedule is given
    pub const UNSCHEDULED: &'static str = "TBA";

    pub fn from_config(
        id: EventId,
        config: EventConfig,
        created_by: ParticipantId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: config.name,
            prize_pool: config.prize_pool,
            format: config.format,
            scheduled_label: config
                .scheduled_label
                .unwrap_or_else(|| Self::UNSCHEDULED.to_string()),
            participant_limit: config.participant_limit,
            total_rounds: config.total_rounds.max(1),
            match_length: config.match_length,
            participants: Vec::new(),
            scores: BTreeMap::new(),
            surviving: None,
            round_history: Vec::new(),
            status: EventStatus::Forming,
            created_by,
            announce_channel: config.announce_channel,
            created_at,
        }
    }

    /// Open for play until completed
    pub fn is_active(&self) -> bool {
        !matches!(self.status, EventStatus::Completed { .. })
    }

    /// The round in progress, or the final round of a completed event
    pub fn current_round(&self) -> Option<&Round> {
        match &self.status {
            EventStatus::Forming => None,
            EventStatus::InRound { round } => Some(round),
            EventStatus::Completed { final_round, .. } => final_round.as_ref(),
        }
    }

    pub fn score_of(&self, participant: ParticipantId) -> i64 {
        self.scores.get(&participant).copied().unwrap_or(0)
    }

    pub fn is_registered(&self, participant: ParticipantId) -> bool {
        self.participants.contains(&participant)
    }

    /// Whether the roster has reached a non-zero limit
    pub fn is_full(&self) -> bool {
        self.participant_limit > 0 && self.participants.len() >= self.participant_limit as usize
    }

    /// 1-based number of the current (or next) round
    pub fn round_number(&self) -> usize {
        self.round_history.len() + usize::from(self.current_round().is_some())
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            name: self.name.clone(),
            prize_pool: self.prize_pool,
            format: self.format,
            scheduled_label: self.scheduled_label.clone(),
            match_length: self.match_length,
            participant_count: self.participants.len(),
            participant_limit: self.participant_limit,
            rounds_played: self.round_history.len(),
            total_rounds: self.total_rounds,
            created_by: self.created_by,
            active: self.is_active(),
        }
    }
}

/// Listing entry for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: EventId,
    pub name: String,
    pub prize_pool: i64,
    pub format: EventFormat,
    pub scheduled_label: String,
    pub match_length: MatchLength,
    pub participant_count: usize,
    pub participant_limit: u32,
    pub rounds_played: usize,
    pub total_rounds: u32,
    pub created_by: ParticipantId,
    pub active: bool,
}

/// Current bracket of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketView {
    pub event_id: EventId,
    pub event_name: String,
    pub format: EventFormat,
    pub match_length: MatchLength,
    pub round_number: usize,
    pub matches: Vec<Match>,
    pub active: bool,
}
