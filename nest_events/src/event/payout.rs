//! Final placements and prize split.
//!
//! Pure computation over a finished event. The result is a list of
//! [`Payout`] instructions; crediting them is left to the caller.

use serde::{Deserialize, Serialize};

use super::{
    models::{Event, EventFormat, ParticipantId},
    standings::standings,
};

/// Podium position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    First,
    Second,
    Third,
}

/// Podium of a finished event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placements {
    pub first: ParticipantId,
    pub second: Option<ParticipantId>,
    /// Swiss: at most one. Elimination: every semifinal loser.
    pub third: Vec<ParticipantId>,
}

/// Prize per podium position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeSplit {
    pub first: i64,
    pub second: i64,
    /// Paid to each third-place participant
    pub third: i64,
}

impl PrizeSplit {
    /// 100% / 50% / 25% of the pool, floored
    pub fn from_pool(prize_pool: i64) -> Self {
        Self {
            first: prize_pool,
            second: prize_pool.div_euclid(2),
            third: prize_pool.div_euclid(4),
        }
    }

    pub fn amount_for(&self, place: Place) -> i64 {
        match place {
            Place::First => self.first,
            Place::Second => self.second,
            Place::Third => self.third,
        }
    }

    /// Expand placements into payout instructions, skipping zero amounts
    pub fn payouts(&self, placements: &Placements) -> Vec<Payout> {
        std::iter::once((placements.first, Place::First))
            .chain(placements.second.map(|p| (p, Place::Second)))
            .chain(placements.third.iter().map(|&p| (p, Place::Third)))
            .map(|(participant, place)| Payout {
                participant,
                amount: self.amount_for(place),
                place,
            })
            .filter(|payout| payout.amount > 0)
            .collect()
    }
}

/// One credit to apply against the currency ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub participant: ParticipantId,
    pub amount: i64,
    pub place: Place,
}

/// Derive the podium from an event's final state.
///
/// Swiss events rank by [`standings`]. Elimination events take the winner
/// and loser of the final match in the current round, and every loser of
/// the last archived round as third place. Returns `None` when there is
/// nobody to place.
pub fn placements(event: &Event) -> Option<Placements> {
    match event.format {
        EventFormat::Swiss => {
            let table = standings(event);
            let mut ranked = table.iter().map(|s| s.participant);
            Some(Placements {
                first: ranked.next()?,
                second: ranked.next(),
                third: ranked.next().into_iter().collect(),
            })
        }
        EventFormat::Elimination => {
            let final_match = event.current_round()?.iter().find(|m| !m.is_bye())?;
            Some(Placements {
                first: final_match.winner?,
                second: final_match.loser(),
                third: event
                    .round_history
                    .last()
                    .map(|semifinal| semifinal.losers())
                    .unwrap_or_default(),
            })
        }
    }
}
