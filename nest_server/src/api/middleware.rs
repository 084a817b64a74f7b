//! Actor identification and admin gating for event commands.
//!
//! The chat gateway in front of this server has already authenticated the
//! member; it forwards their ID in `X-Actor-Id`. Administrative commands
//! additionally carry the shared `X-Admin-Token`.
//!
//! # Extracting the actor
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use nest_server::api::middleware::Actor;
//!
//! async fn handler(Extension(Actor(member)): Extension<Actor>) -> String {
//!     format!("Command issued by {}", member)
//! }
//! # let _ = handler;
//! ```

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use nest_events::event::ParticipantId;
use subtle::ConstantTimeEq;

use super::AppState;

/// Header carrying the acting member's ID
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Member who issued the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub ParticipantId);

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .map(Actor)
}

/// Require `X-Actor-Id` and inject it as an [`Actor`] extension.
///
/// - **Missing or non-numeric header**: Returns `401 Unauthorized`
pub async fn actor_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let actor = actor_from_headers(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Require a matching `X-Admin-Token`.
///
/// The comparison runs in constant time.
///
/// - **Missing header**: Returns `401 Unauthorized`
/// - **Wrong token**: Returns `403 Forbidden`
pub async fn admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !token_matches(token, &state.admin_token) {
        tracing::warn!(
            uri = %request.uri(),
            "SECURITY: admin command rejected, invalid token"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
