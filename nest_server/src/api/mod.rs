//! HTTP API for the event server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework
//! - **Tower**: Middleware for CORS, request IDs, actor and admin checks
//! - **EventManager**: One transaction per command, serialized per guild
//!
//! # Modules
//!
//! - [`events`]: Event command and query handlers
//! - [`middleware`]: Actor extraction and admin gating
//! - [`request_id`]: Request correlation and HTTP metrics
//!
//! # Endpoints Overview
//!
//! All event routes are nested under `/api/v1/guilds/{guild_id}/events`.
//!
//! ## Public
//! - `GET /` - List active events
//! - `GET /{event_id}` - Event details
//! - `GET /{event_id}/bracket` - Current round
//! - `GET /{event_id}/standings` - Score + Buchholz table
//!
//! ## Member (`X-Actor-Id`)
//! - `POST /{event_id}/join` - Join
//! - `POST /{event_id}/leave` - Leave
//!
//! ## Admin (`X-Actor-Id` + `X-Admin-Token`)
//! - `POST /` - Create event
//! - `POST /{event_id}/participants` - Add a member
//! - `POST /{event_id}/pairings` - Pair the next round
//! - `POST /{event_id}/win` - Record a match winner
//! - `POST /{event_id}/finish` - End now, full pool to one member
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use nest_events::{event::EventManager, ledger::MemoryLedger, store::MemoryEventStore};
//! use nest_server::{api::{create_router, AppState}, config::EventDefaultsConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     event_manager: Arc::new(EventManager::new(
//!         Arc::new(MemoryEventStore::new()),
//!         Arc::new(MemoryLedger::new()),
//!     )),
//!     admin_token: Arc::from("0123456789abcdef"),
//!     event_defaults: EventDefaultsConfig::default(),
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod events;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use nest_events::event::EventManager;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::EventDefaultsConfig;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub event_manager: Arc<EventManager>,
    pub admin_token: Arc<str>,
    pub event_defaults: EventDefaultsConfig,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health                                           - Health check
/// GET  /api/v1/guilds/{guild_id}/events                  - List events
/// POST /api/v1/guilds/{guild_id}/events                  - Create event (admin)
/// GET  /api/v1/guilds/{guild_id}/events/{id}             - Event details
/// GET  /api/v1/guilds/{guild_id}/events/{id}/bracket     - Current round
/// GET  /api/v1/guilds/{guild_id}/events/{id}/standings   - Standings
/// POST /api/v1/guilds/{guild_id}/events/{id}/join        - Join (member)
/// POST /api/v1/guilds/{guild_id}/events/{id}/leave       - Leave (member)
/// POST /api/v1/guilds/{guild_id}/events/{id}/participants - Add member (admin)
/// POST /api/v1/guilds/{guild_id}/events/{id}/pairings    - Pair round (admin)
/// POST /api/v1/guilds/{guild_id}/events/{id}/win         - Record winner (admin)
/// POST /api/v1/guilds/{guild_id}/events/{id}/finish      - Finish (admin)
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Create API v1 router with all versioned endpoints.
fn create_v1_router(state: AppState) -> Router<AppState> {
    const EVENTS: &str = "/guilds/{guild_id}/events";
    const EVENT: &str = "/guilds/{guild_id}/events/{event_id}";

    let public_routes = Router::new()
        .route(EVENTS, get(events::list_events))
        .route(EVENT, get(events::get_event))
        .route(&format!("{EVENT}/bracket"), get(events::bracket))
        .route(&format!("{EVENT}/standings"), get(events::standings));

    let member_routes = Router::new()
        .route(&format!("{EVENT}/join"), post(events::join_event))
        .route(&format!("{EVENT}/leave"), post(events::leave_event))
        .layer(axum::middleware::from_fn(middleware::actor_middleware));

    // Admin check runs first (outermost), then actor extraction
    let admin_routes = Router::new()
        .route(EVENTS, post(events::create_event))
        .route(&format!("{EVENT}/participants"), post(events::add_participant))
        .route(&format!("{EVENT}/pairings"), post(events::generate_pairings))
        .route(&format!("{EVENT}/win"), post(events::declare_winner))
        .route(&format!("{EVENT}/finish"), post(events::finish_event))
        .layer(axum::middleware::from_fn(middleware::actor_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if the event store is reachable, or
/// `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","store":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.event_manager.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
