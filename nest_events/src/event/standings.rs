//! Score and Buchholz standings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::models::{Event, EventFormat, EventId, ParticipantId};

/// One row of the standings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub participant: ParticipantId,
    pub score: i64,
    /// Sum of the scores of every non-bye opponent faced
    pub buchholz: i64,
}

/// Standings table of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsView {
    pub event_id: EventId,
    pub event_name: String,
    pub format: EventFormat,
    pub rounds_played: usize,
    pub active: bool,
    pub standings: Vec<Standing>,
}

/// Rank the current roster by score, then Buchholz.
///
/// Opponents are taken from every archived round plus the current (or
/// final) round. Byes count for neither side. Remaining ties keep roster
/// order.
pub fn standings(event: &Event) -> Vec<Standing> {
    let mut buchholz: HashMap<ParticipantId, i64> = HashMap::new();

    let rounds = event.round_history.iter().chain(event.current_round());
    for m in rounds.flat_map(|round| round.iter()) {
        if let Some(player2) = m.player2 {
            *buchholz.entry(m.player1).or_default() += event.score_of(player2);
            *buchholz.entry(player2).or_default() += event.score_of(m.player1);
        }
    }

    let mut table: Vec<Standing> = event
        .participants
        .iter()
        .map(|&participant| Standing {
            participant,
            score: event.score_of(participant),
            buchholz: buchholz.get(&participant).copied().unwrap_or(0),
        })
        .collect();

    // sort_by is stable, so roster order breaks the remaining ties
    table.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.buchholz.cmp(&a.buchholz))
    });
    table
}

/// Build the standings view of an event
pub fn standings_view(event: &Event) -> StandingsView {
    StandingsView {
        event_id: event.id,
        event_name: event.name.clone(),
        format: event.format,
        rounds_played: event.round_history.len(),
        active: event.is_active(),
        standings: standings(event),
    }
}
