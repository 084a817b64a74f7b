//! Next-round generation for elimination and Swiss events.
//!
//! Pairing is only allowed once every match of the current round has a
//! winner. All validation happens before the event is touched, so a
//! rejected call leaves the event exactly as it was.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::{
    errors::{EventError, EventResult},
    models::{Event, EventFormat, EventStatus, Match, ParticipantId, Round},
    standings::standings,
};

/// Result of a successful pairing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingOutcome {
    /// 1-based number of the new round
    pub round_number: usize,
    pub round: Round,
    /// Whether the previous round was moved into history
    pub archived_previous: bool,
}

/// Generate the next round of `event`.
///
/// Swiss events sort the roster by descending score (stable, so ties keep
/// roster order) and pair neighbours. Rematches are not avoided.
/// Elimination events shuffle the surviving players with `rng`.
/// An unpaired last player receives a bye.
pub fn generate_pairings<R: Rng + ?Sized>(
    event: &mut Event,
    rng: &mut R,
) -> EventResult<PairingOutcome> {
    let finished = match &event.status {
        EventStatus::Completed { champion, .. } => {
            return Err(EventError::TournamentComplete {
                champion: *champion,
            });
        }
        EventStatus::InRound { round } => {
            let pending = round.pending();
            if pending > 0 {
                return Err(EventError::RoundInProgress { pending });
            }
            Some(round)
        }
        EventStatus::Forming => None,
    };

    let archived_previous = finished.is_some();
    let round_number = event.round_history.len() + usize::from(archived_previous) + 1;

    let (players, surviving) = match event.format {
        EventFormat::Swiss => (swiss_order(event, round_number)?, None),
        EventFormat::Elimination => {
            let pool = elimination_pool(event, finished)?;
            let mut shuffled = pool.clone();
            shuffled.shuffle(rng);
            (shuffled, Some(pool))
        }
    };

    // Validation done; mutate from here on
    if let EventStatus::InRound { round } = std::mem::take(&mut event.status) {
        event.round_history.push(round);
    }

    match event.format {
        EventFormat::Swiss => {
            for &participant in &event.participants {
                event.scores.entry(participant).or_insert(0);
            }
        }
        EventFormat::Elimination => event.surviving = surviving,
    }

    let round = pair_in_order(&players);
    event.status = EventStatus::InRound {
        round: round.clone(),
    };

    Ok(PairingOutcome {
        round_number,
        round,
        archived_previous,
    })
}

fn swiss_order(event: &Event, round_number: usize) -> EventResult<Vec<ParticipantId>> {
    if round_number > event.total_rounds as usize {
        return Err(EventError::TournamentComplete {
            champion: standings(event).first().map(|s| s.participant),
        });
    }

    if event.participants.len() < 2 {
        return Err(EventError::NotEnoughPlayers {
            have: event.participants.len(),
        });
    }

    let mut players = event.participants.clone();
    players.sort_by_key(|&p| Reverse(event.score_of(p)));
    Ok(players)
}

fn elimination_pool(event: &Event, finished: Option<&Round>) -> EventResult<Vec<ParticipantId>> {
    let pool = match (&event.surviving, finished) {
        (None, _) => {
            if event.participants.len() < 2 {
                return Err(EventError::NotEnoughPlayers {
                    have: event.participants.len(),
                });
            }
            event.participants.clone()
        }
        (Some(_), Some(round)) => round.winners(),
        (Some(alive), None) => alive.clone(),
    };

    match pool.as_slice() {
        [] => Err(EventError::TournamentComplete { champion: None }),
        [champion] => Err(EventError::TournamentComplete {
            champion: Some(*champion),
        }),
        _ => Ok(pool),
    }
}

/// Pair players front to back; a lone last player gets a bye
fn pair_in_order(players: &[ParticipantId]) -> Round {
    let matches = players
        .chunks(2)
        .map(|pair| match *pair {
            [player1, player2] => Match::new(player1, player2),
            [player] => Match::bye(player),
            _ => unreachable!("chunks(2) yields one or two players"),
        })
        .collect();
    Round::new(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::models::EventConfig;
    use chrono::Utc;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn event_with(config: EventConfig, participants: &[ParticipantId]) -> Event {
        let mut event = Event::from_config(1, config, 1, Utc::now());
        event.participants = participants.to_vec();
        event
    }

    fn decide_all(event: &mut Event, pick_first: bool) {
        let EventStatus::InRound { round } = &mut event.status else {
            panic!("no round in progress");
        };
        for m in round.matches_mut() {
            if m.winner.is_none() {
                let winner = if pick_first {
                    m.player1
                } else {
                    m.player2.unwrap()
                };
                m.winner = Some(winner);
                *event.scores.entry(winner).or_insert(0) += 1;
            }
        }
    }

    #[test]
    fn test_swiss_first_round_pairs_in_join_order() {
        let mut event = event_with(EventConfig::swiss("League", 10, 3), &[5, 6, 7, 8]);
        let outcome = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(outcome.round_number, 1);
        assert!(!outcome.archived_previous);
        assert_eq!(
            outcome.round.matches(),
            &[Match::new(5, 6), Match::new(7, 8)]
        );
        assert_eq!(event.scores.len(), 4);
        assert!(event.scores.values().all(|&s| s == 0));
    }

    #[test]
    fn test_odd_roster_gets_bye_for_last_player() {
        let mut event = event_with(EventConfig::swiss("League", 10, 3), &[1, 2, 3]);
        let outcome = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap();

        let bye = outcome.round.matches().last().unwrap();
        assert_eq!(bye, &Match::bye(3));
        assert_eq!(bye.winner, Some(bye.player1));
    }

    #[test]
    fn test_pending_round_blocks_pairing_without_changes() {
        let mut event = event_with(EventConfig::swiss("League", 10, 3), &[1, 2, 3, 4]);
        generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap();
        let before = event.clone();

        let err = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, EventError::RoundInProgress { pending: 2 }));
        assert_eq!(event, before);
    }

    #[test]
    fn test_swiss_stops_after_total_rounds() {
        let mut event = event_with(EventConfig::swiss("League", 10, 1), &[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(3);
        generate_pairings(&mut event, &mut rng).unwrap();
        decide_all(&mut event, true);
        let before = event.clone();

        let err = generate_pairings(&mut event, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            EventError::TournamentComplete { champion: Some(1) }
        ));
        assert_eq!(event, before, "rejected call must not archive the round");
    }

    #[test]
    fn test_swiss_second_round_sorts_by_score() {
        let mut event = event_with(EventConfig::swiss("League", 10, 3), &[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(3);
        generate_pairings(&mut event, &mut rng).unwrap();
        decide_all(&mut event, false);

        let outcome = generate_pairings(&mut event, &mut rng).unwrap();
        assert!(outcome.archived_previous);
        assert_eq!(outcome.round_number, 2);
        assert_eq!(event.round_history.len(), 1);
        assert_eq!(
            outcome.round.matches(),
            &[Match::new(2, 4), Match::new(1, 3)]
        );
    }

    #[test]
    fn test_swiss_needs_two_players() {
        let mut event = event_with(EventConfig::swiss("League", 10, 3), &[1]);
        let err = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, EventError::NotEnoughPlayers { have: 1 }));
        assert_eq!(event.status, EventStatus::Forming);
    }

    #[test]
    fn test_elimination_needs_two_players() {
        let mut event = event_with(EventConfig::elimination("Cup", 10), &[1]);
        let err = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, EventError::NotEnoughPlayers { have: 1 }));
        assert!(event.surviving.is_none());
    }

    #[test]
    fn test_elimination_round_covers_every_participant_once() {
        let roster: Vec<ParticipantId> = (1..=7).collect();
        let mut event = event_with(EventConfig::elimination("Cup", 10), &roster);
        let outcome = generate_pairings(&mut event, &mut StdRng::seed_from_u64(9)).unwrap();

        assert_eq!(outcome.round.len(), 4);
        let seen: HashSet<_> = outcome
            .round
            .iter()
            .flat_map(|m| std::iter::once(m.player1).chain(m.player2))
            .collect();
        assert_eq!(seen.len(), 7);
        assert_eq!(outcome.round.iter().filter(|m| m.is_bye()).count(), 1);
        assert_eq!(event.surviving.as_deref(), Some(roster.as_slice()));
    }

    #[test]
    fn test_elimination_advances_winners_and_detects_champion() {
        let mut event = event_with(EventConfig::elimination("Cup", 10), &[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(11);

        generate_pairings(&mut event, &mut rng).unwrap();
        decide_all(&mut event, true);
        let semifinal_winners: HashSet<_> =
            event.current_round().unwrap().winners().into_iter().collect();

        let final_round = generate_pairings(&mut event, &mut rng).unwrap();
        assert_eq!(final_round.round.len(), 1);
        let finalists: HashSet<_> = final_round
            .round
            .iter()
            .flat_map(|m| std::iter::once(m.player1).chain(m.player2))
            .collect();
        assert_eq!(finalists, semifinal_winners);

        decide_all(&mut event, true);
        let champion = event.current_round().unwrap().winners()[0];
        let err = generate_pairings(&mut event, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            EventError::TournamentComplete { champion: Some(c) } if c == champion
        ));
    }

    #[test]
    fn test_completed_event_rejects_pairing() {
        let mut event = event_with(EventConfig::elimination("Cup", 10), &[1, 2]);
        event.status = EventStatus::Completed {
            final_round: None,
            champion: Some(2),
        };
        let err = generate_pairings(&mut event, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(
            err,
            EventError::TournamentComplete { champion: Some(2) }
        ));
    }

    #[test]
    fn test_pair_in_order_shapes() {
        assert!(pair_in_order(&[]).is_empty());
        assert_eq!(pair_in_order(&[4]).matches(), &[Match::bye(4)]);
        assert_eq!(
            pair_in_order(&[1, 2, 3]).matches(),
            &[Match::new(1, 2), Match::bye(3)]
        );
    }
}
