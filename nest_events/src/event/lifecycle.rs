//! Event creation, registration and the administrative finish override.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    errors::{EventError, EventResult},
    models::{Event, EventConfig, EventId, EventStatus, ParticipantId},
    payout::{Payout, Place},
};

/// Result of [`finish`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishOutcome {
    pub event_id: EventId,
    pub event_name: String,
    pub winner: ParticipantId,
    pub prize: i64,
    pub payouts: Vec<Payout>,
}

/// Append a new event to a guild's collection and return a copy of it.
///
/// IDs are sequential: the new event gets `events.len() + 1`.
pub fn create_event(
    events: &mut Vec<Event>,
    config: EventConfig,
    created_by: ParticipantId,
    now: DateTime<Utc>,
) -> Event {
    let id = events.len() as EventId + 1;
    let event = Event::from_config(id, config, created_by, now);
    events.push(event.clone());
    event
}

/// Look up any event, finished or not
pub fn find_event(events: &[Event], event_id: EventId) -> EventResult<&Event> {
    events
        .iter()
        .find(|e| e.id == event_id)
        .ok_or(EventError::NotFound(event_id))
}

/// Look up any event for mutation, finished or not
pub fn find_event_mut(events: &mut [Event], event_id: EventId) -> EventResult<&mut Event> {
    events
        .iter_mut()
        .find(|e| e.id == event_id)
        .ok_or(EventError::NotFound(event_id))
}

/// Look up an event that is still open for play
pub fn find_active_mut(events: &mut [Event], event_id: EventId) -> EventResult<&mut Event> {
    let event = find_event_mut(events, event_id)?;
    ensure_active(event)?;
    Ok(event)
}

pub(crate) fn ensure_active(event: &Event) -> EventResult<()> {
    if event.is_active() {
        Ok(())
    } else {
        Err(EventError::NotFound(event.id))
    }
}

/// Register a participant on their own behalf
pub fn join(event: &mut Event, participant: ParticipantId) -> EventResult<()> {
    admit(event, participant)
}

/// Register a participant on behalf of an administrator.
///
/// Same admission rules as [`join`].
pub fn admin_add_participant(event: &mut Event, participant: ParticipantId) -> EventResult<()> {
    admit(event, participant)
}

fn admit(event: &mut Event, participant: ParticipantId) -> EventResult<()> {
    ensure_active(event)?;

    if event.is_registered(participant) {
        return Err(EventError::AlreadyRegistered(participant));
    }

    if event.is_full() {
        return Err(EventError::Full {
            limit: event.participant_limit,
        });
    }

    event.participants.push(participant);
    Ok(())
}

/// Remove a participant from the roster.
///
/// Matches already played and points already scored are kept.
pub fn leave(event: &mut Event, participant: ParticipantId) -> EventResult<()> {
    ensure_active(event)?;

    let position = event
        .participants
        .iter()
        .position(|&p| p == participant)
        .ok_or(EventError::NotRegistered(participant))?;

    event.participants.remove(position);
    Ok(())
}

/// End an event immediately and award the whole pool to `winner`.
///
/// Standings and bracket state are not consulted. Any round in progress is
/// kept as the final round for later queries.
pub fn finish(event: &mut Event, winner: ParticipantId) -> EventResult<FinishOutcome> {
    ensure_active(event)?;

    let final_round = match std::mem::take(&mut event.status) {
        EventStatus::InRound { round } => Some(round),
        _ => None,
    };
    event.status = EventStatus::Completed {
        final_round,
        champion: Some(winner),
    };

    let payouts = if event.prize_pool > 0 {
        vec![Payout {
            participant: winner,
            amount: event.prize_pool,
            place: Place::First,
        }]
    } else {
        Vec::new()
    };

    Ok(FinishOutcome {
        event_id: event.id,
        event_name: event.name.clone(),
        winner,
        prize: event.prize_pool,
        payouts,
    })
}
