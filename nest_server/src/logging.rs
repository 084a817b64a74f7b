//! Structured logging configuration.
//!
//! Installs a `tracing` subscriber that also receives the `log` records
//! emitted by the `nest_events` engine, plus helpers for the structured
//! records the server writes itself.

use nest_events::event::{EventId, GuildId, ParticipantId, Payout};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use nest_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log an event command with structured data
///
/// # Arguments
///
/// * `command` - Command name (e.g. `join`, `pairings`)
/// * `guild_id` - Guild the command ran in
/// * `event_id` - Target event, if any
/// * `actor` - Member who issued the command
/// * `request_id` - Correlation ID of the HTTP request
/// * `outcome` - `ok` or the error kind
///
/// # Example
///
/// ```
/// use nest_server::logging::log_event_command;
///
/// log_event_command("join", 1, Some(3), Some(42), "5f0c9a", "ok");
/// ```
pub fn log_event_command(
    command: &str,
    guild_id: GuildId,
    event_id: Option<EventId>,
    actor: Option<ParticipantId>,
    request_id: &str,
    outcome: &str,
) {
    tracing::info!(
        command = command,
        guild_id = guild_id,
        event_id = event_id,
        actor = actor,
        request_id = request_id,
        outcome = outcome,
        "Event command handled"
    );
}

/// Log a prize that the ledger refused
pub fn log_payout_failure(
    guild_id: GuildId,
    event_id: EventId,
    request_id: &str,
    payout: &Payout,
    reason: &str,
) {
    tracing::error!(
        guild_id = guild_id,
        event_id = event_id,
        request_id = request_id,
        participant = payout.participant,
        amount = payout.amount,
        place = ?payout.place,
        reason = reason,
        "PAYOUT: credit failed, manual correction required"
    );
}
