//! Recording match winners and detecting round and tournament completion.

use serde::{Deserialize, Serialize};

use super::{
    errors::{EventError, EventResult},
    lifecycle::ensure_active,
    models::{ChannelId, Event, EventFormat, EventId, EventStatus, ParticipantId},
    payout::{Payout, Placements, PrizeSplit, placements},
};

/// Result of [`declare_winner`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinOutcome {
    pub event_id: EventId,
    pub winner: ParticipantId,
    pub loser: Option<ParticipantId>,
    /// Every match of the current round now has a winner
    pub round_complete: bool,
    /// Present when this result ended the tournament
    pub completion: Option<Completion>,
}

/// Final result of a tournament, returned for payout and announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub event_id: EventId,
    pub event_name: String,
    pub announce_channel: Option<ChannelId>,
    pub placements: Placements,
    pub split: PrizeSplit,
    pub payouts: Vec<Payout>,
}

/// Record `winner` as the winner of their undecided match in the current round.
///
/// Swiss winners gain one point; losers lose nothing. When the result
/// completes the round, the tournament is checked for completion:
/// a Swiss event is over once the last scheduled round is decided, an
/// elimination event once a single-match round (the final) is decided.
/// A finished event becomes `Completed` and the returned [`Completion`]
/// carries the payouts the caller must apply.
///
/// The round itself is not archived here; the next pairing call does that.
pub fn declare_winner(event: &mut Event, winner: ParticipantId) -> EventResult<WinOutcome> {
    ensure_active(event)?;

    let EventStatus::InRound { round } = &mut event.status else {
        return Err(EventError::NoActiveRound);
    };
    if round.is_empty() {
        return Err(EventError::NoActiveRound);
    }

    let Some(index) = round
        .iter()
        .position(|m| m.involves(winner) && !m.is_decided())
    else {
        let existing = round
            .iter()
            .find(|m| m.involves(winner))
            .and_then(|m| m.winner);
        return Err(match existing {
            Some(existing) => EventError::AlreadyDecided {
                participant: winner,
                winner: existing,
            },
            None => EventError::NotPlaying(winner),
        });
    };

    let entry = &mut round.matches_mut()[index];
    entry.winner = Some(winner);
    let loser = entry.opponent_of(winner);
    let round_complete = round.is_decided();
    let round_len = round.len();

    if event.format == EventFormat::Swiss {
        *event.scores.entry(winner).or_insert(0) += 1;
    }

    let tournament_over = round_complete
        && match event.format {
            EventFormat::Swiss => event.round_history.len() + 1 >= event.total_rounds as usize,
            EventFormat::Elimination => round_len == 1,
        };

    let completion = if tournament_over {
        complete(event)
    } else {
        None
    };

    Ok(WinOutcome {
        event_id: event.id,
        winner,
        loser,
        round_complete,
        completion,
    })
}

/// Mark the event completed and compute its podium
fn complete(event: &mut Event) -> Option<Completion> {
    let podium = placements(event);

    let final_round = match std::mem::take(&mut event.status) {
        EventStatus::InRound { round } => Some(round),
        _ => None,
    };
    event.status = EventStatus::Completed {
        final_round,
        champion: podium.as_ref().map(|p| p.first),
    };

    let podium = podium?;
    let split = PrizeSplit::from_pool(event.prize_pool);
    Some(Completion {
        event_id: event.id,
        event_name: event.name.clone(),
        announce_channel: event.announce_channel,
        payouts: split.payouts(&podium),
        placements: podium,
        split,
    })
}
