//! Event command handlers.
//!
//! Every route lives under `/api/v1/guilds/{guild_id}/events`. Commands that
//! change an event need an `X-Actor-Id` header; administrative ones also
//! need `X-Admin-Token`. Read-only routes are public.
//!
//! # Examples
//!
//! Create a Swiss event:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/guilds/1/events \
//!   -H "X-Actor-Id: 42" -H "X-Admin-Token: TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Weekly League", "prize_pool": 500, "format": "swiss", "total_rounds": 4}'
//! ```
//!
//! Join it:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/guilds/1/events/1/join -H "X-Actor-Id: 77"
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use nest_events::event::{
    BracketView, Event, EventConfig, EventError, EventFormat, EventId, EventSummary,
    FinishReport, GuildId, MatchLength, PairingOutcome, ParticipantId, PayoutReport,
    StandingsView, WinReport,
};
use serde::{Deserialize, Serialize};

use super::{AppState, middleware::Actor, request_id::RequestId};
use crate::{logging, metrics};

/// Error body returned by every handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Matches the `x-request-id` response header
    pub request_id: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub prize_pool: i64,
    pub format: EventFormat,
    pub scheduled_label: Option<String>,
    pub participant_limit: Option<u32>,
    /// Swiss only
    pub total_rounds: Option<u32>,
    /// 1, 3 or 5
    pub best_of: Option<MatchLength>,
    pub announce_channel: Option<i64>,
}

/// Body of commands that target another member
#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub participant: ParticipantId,
}

fn status_for(err: &EventError) -> StatusCode {
    match err {
        EventError::NotFound(_) => StatusCode::NOT_FOUND,
        EventError::AlreadyRegistered(_)
        | EventError::Full { .. }
        | EventError::RoundInProgress { .. }
        | EventError::TournamentComplete { .. }
        | EventError::NoActiveRound
        | EventError::AlreadyDecided { .. } => StatusCode::CONFLICT,
        EventError::NotRegistered(_)
        | EventError::NotEnoughPlayers { .. }
        | EventError::NotPlaying(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EventError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// One command as it appears in the logs
struct CommandScope {
    command: &'static str,
    guild_id: GuildId,
    event_id: Option<EventId>,
    actor: Option<ParticipantId>,
    request_id: RequestId,
}

impl CommandScope {
    fn new(command: &'static str, guild_id: GuildId, request_id: RequestId) -> Self {
        Self {
            command,
            guild_id,
            event_id: None,
            actor: None,
            request_id,
        }
    }

    fn event(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    fn actor(mut self, actor: ParticipantId) -> Self {
        self.actor = Some(actor);
        self
    }

    fn accepted(&self) {
        self.log("ok");
    }

    fn log(&self, outcome: &str) {
        logging::log_event_command(
            self.command,
            self.guild_id,
            self.event_id,
            self.actor,
            self.request_id.as_str(),
            outcome,
        );
    }

    fn error_body(&self, status: StatusCode, error: String, code: &str) -> ApiError {
        metrics::commands_rejected_total(code);
        (
            status,
            Json(ErrorResponse {
                error,
                code: code.to_string(),
                request_id: self.request_id.0.clone(),
            }),
        )
    }

    /// Map an engine error to a response, logging it on the way out
    fn reject(&self, err: EventError) -> ApiError {
        if err.is_domain() {
            self.log(err.code());
        } else {
            tracing::error!(
                command = self.command,
                guild_id = self.guild_id,
                event_id = self.event_id,
                request_id = self.request_id.as_str(),
                error = %err,
                "Store failure"
            );
        }
        self.error_body(status_for(&err), err.client_message(), err.code())
    }

    fn invalid_request(&self, reason: &str) -> ApiError {
        self.log("invalid_request");
        self.error_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            reason.to_string(),
            "invalid_request",
        )
    }

    fn report_payouts(&self, event_id: EventId, report: &PayoutReport) {
        for credited in &report.credited {
            metrics::payout_credited(credited.payout.amount);
        }
        for failed in &report.failed {
            metrics::payout_failures_total();
            logging::log_payout_failure(
                self.guild_id,
                event_id,
                self.request_id.as_str(),
                &failed.payout,
                &failed.reason,
            );
        }
    }
}

/// Create a new event (admin).
///
/// Returns `201 Created` with the new event.
pub async fn create_event(
    State(state): State<AppState>,
    Path(guild_id): Path<GuildId>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
    Json(request): Json<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let scope = CommandScope::new("create", guild_id, request_id).actor(actor);

    let name = request.name.trim();
    if name.is_empty() {
        return Err(scope.invalid_request("Event name must not be empty"));
    }
    if request.prize_pool < 0 {
        return Err(scope.invalid_request("Prize pool must not be negative"));
    }

    let defaults = state.event_defaults;
    let mut config = EventConfig::new(name, request.prize_pool, request.format)
        .with_limit(
            request
                .participant_limit
                .unwrap_or(defaults.participant_limit),
        )
        .with_rounds(request.total_rounds.unwrap_or(defaults.swiss_rounds))
        .with_match_length(request.best_of.unwrap_or_default());
    if let Some(label) = request.scheduled_label.filter(|l| !l.trim().is_empty()) {
        config = config.with_schedule(label);
    }
    if let Some(channel) = request.announce_channel {
        config = config.with_announce_channel(channel);
    }

    let event = state
        .event_manager
        .create_event(guild_id, config, actor)
        .await
        .map_err(|e| scope.reject(e))?;

    metrics::events_created_total(match event.format {
        EventFormat::Elimination => "elimination",
        EventFormat::Swiss => "swiss",
    });
    scope.event(event.id).accepted();

    Ok((StatusCode::CREATED, Json(event)))
}

/// List active events of a guild.
pub async fn list_events(
    State(state): State<AppState>,
    Path(guild_id): Path<GuildId>,
    request_id: RequestId,
) -> ApiResult<Json<Vec<EventSummary>>> {
    let scope = CommandScope::new("list", guild_id, request_id);
    state
        .event_manager
        .list_events(guild_id)
        .await
        .map(Json)
        .map_err(|e| scope.reject(e))
}

/// Full state of one event.
pub async fn get_event(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    request_id: RequestId,
) -> ApiResult<Json<Event>> {
    let scope = CommandScope::new("get", guild_id, request_id).event(event_id);
    state
        .event_manager
        .get_event(guild_id, event_id)
        .await
        .map(Json)
        .map_err(|e| scope.reject(e))
}

/// Join an event as the acting member.
pub async fn join_event(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
) -> ApiResult<Json<EventSummary>> {
    let scope = CommandScope::new("join", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let summary = state
        .event_manager
        .join(guild_id, event_id, actor)
        .await
        .map_err(|e| scope.reject(e))?;

    scope.accepted();
    Ok(Json(summary))
}

/// Leave an event as the acting member.
pub async fn leave_event(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
) -> ApiResult<Json<EventSummary>> {
    let scope = CommandScope::new("leave", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let summary = state
        .event_manager
        .leave(guild_id, event_id, actor)
        .await
        .map_err(|e| scope.reject(e))?;

    scope.accepted();
    Ok(Json(summary))
}

/// Register another member (admin).
pub async fn add_participant(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
    Json(request): Json<ParticipantRequest>,
) -> ApiResult<Json<EventSummary>> {
    let scope = CommandScope::new("add_participant", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let summary = state
        .event_manager
        .add_participant(guild_id, event_id, request.participant)
        .await
        .map_err(|e| scope.reject(e))?;

    scope.accepted();
    Ok(Json(summary))
}

/// Generate the next round (admin).
pub async fn generate_pairings(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
) -> ApiResult<Json<PairingOutcome>> {
    let scope = CommandScope::new("pairings", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let outcome = state
        .event_manager
        .generate_pairings(guild_id, event_id)
        .await
        .map_err(|e| scope.reject(e))?;

    metrics::pairings_generated_total();
    scope.accepted();
    Ok(Json(outcome))
}

/// Record a match winner (admin).
///
/// When this ends the tournament the response carries the podium and the
/// payout report.
pub async fn declare_winner(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
    Json(request): Json<ParticipantRequest>,
) -> ApiResult<Json<WinReport>> {
    let scope = CommandScope::new("win", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let report = state
        .event_manager
        .declare_winner(guild_id, event_id, request.participant)
        .await
        .map_err(|e| scope.reject(e))?;

    metrics::results_recorded_total();
    if report.outcome.completion.is_some() {
        metrics::tournaments_completed_total("results");
        scope.report_payouts(event_id, &report.payouts);
    }
    scope.accepted();
    Ok(Json(report))
}

/// End an event now, awarding the whole pool to one member (admin).
pub async fn finish_event(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    Extension(Actor(actor)): Extension<Actor>,
    request_id: RequestId,
    Json(request): Json<ParticipantRequest>,
) -> ApiResult<Json<FinishReport>> {
    let scope = CommandScope::new("finish", guild_id, request_id)
        .event(event_id)
        .actor(actor);
    let report = state
        .event_manager
        .finish(guild_id, event_id, request.participant)
        .await
        .map_err(|e| scope.reject(e))?;

    metrics::tournaments_completed_total("finish");
    scope.report_payouts(event_id, &report.payouts);
    scope.accepted();
    Ok(Json(report))
}

/// Current (or final) round of an event.
pub async fn bracket(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    request_id: RequestId,
) -> ApiResult<Json<BracketView>> {
    let scope = CommandScope::new("bracket", guild_id, request_id).event(event_id);
    state
        .event_manager
        .bracket(guild_id, event_id)
        .await
        .map(Json)
        .map_err(|e| scope.reject(e))
}

/// Standings of an event.
pub async fn standings(
    State(state): State<AppState>,
    Path((guild_id, event_id)): Path<(GuildId, EventId)>,
    request_id: RequestId,
) -> ApiResult<Json<StandingsView>> {
    let scope = CommandScope::new("standings", guild_id, request_id).event(event_id);
    state
        .event_manager
        .standings(guild_id, event_id)
        .await
        .map(Json)
        .map_err(|e| scope.reject(e))
}
