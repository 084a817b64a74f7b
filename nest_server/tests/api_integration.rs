//! Integration tests for the HTTP command surface.
//!
//! Runs the full router against in-memory store and ledger backends.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nest_events::{event::EventManager, ledger::MemoryLedger, store::MemoryEventStore};
use nest_server::{
    api::{self, AppState},
    config::EventDefaultsConfig,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const ADMIN_TOKEN: &str = "test_admin_token_0123";
const ADMIN: i64 = 1;

/// Helper to create test server backed by memory
fn create_test_server() -> (axum::Router, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    let event_manager = Arc::new(EventManager::new(
        Arc::new(MemoryEventStore::new()),
        ledger.clone(),
    ));

    let state = AppState {
        event_manager,
        admin_token: Arc::from(ADMIN_TOKEN),
        event_defaults: EventDefaultsConfig::default(),
    };

    (api::create_router(state), ledger)
}

fn request(
    method: &str,
    uri: &str,
    actor: Option<i64>,
    admin: bool,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor.to_string());
    }
    if admin {
        builder = builder.header("x-admin-token", ADMIN_TOKEN);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    request("GET", uri, None, false, None)
}

fn join(event_id: i64, member: i64) -> Request<Body> {
    let uri = format!("/api/v1/guilds/1/events/{event_id}/join");
    request("POST", &uri, Some(member), false, None)
}

fn admin_post(uri: &str, body: Option<Value>) -> Request<Body> {
    request("POST", uri, Some(ADMIN), true, body)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn create_event(app: &axum::Router, body: Value) -> i64 {
    let (status, event) = send(app, admin_post("/api/v1/guilds/1/events", Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    event["id"].as_i64().unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

// ============================================================================
// Authorization Tests
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_token() {
    let (app, _) = create_test_server();
    let body = json!({"name": "Cup", "format": "elimination"});

    let (status, _) = send(
        &app,
        request("POST", "/api/v1/guilds/1/events", Some(ADMIN), false, Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut wrong = request("POST", "/api/v1/guilds/1/events", Some(ADMIN), false, Some(body));
    wrong
        .headers_mut()
        .insert("x-admin-token", "not_the_right_token".parse().unwrap());
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_join_requires_actor() {
    let (app, _) = create_test_server();
    let id = create_event(&app, json!({"name": "Cup", "format": "elimination"})).await;

    let (status, _) = send(
        &app,
        request("POST", &format!("/api/v1/guilds/1/events/{id}/join"), None, false, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Event Command Tests
// ============================================================================

#[tokio::test]
async fn test_create_list_and_join() {
    let (app, _) = create_test_server();
    let id = create_event(
        &app,
        json!({
            "name": "Friday Cup",
            "prize_pool": 100,
            "format": "elimination",
            "participant_limit": 2,
            "best_of": 3
        }),
    )
    .await;

    for member in [10, 11] {
        let (status, summary) = send(&app, join(id, member)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["match_length"], 3);
    }

    let (status, error) = send(&app, join(id, 12)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "full");

    let (status, list) = send(&app, get("/api/v1/guilds/1/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["participant_count"], 2);
    assert_eq!(list[0]["scheduled_label"], "TBA");
}

#[tokio::test]
async fn test_invalid_create_request_rejected() {
    let (app, _) = create_test_server();

    let (status, error) = send(
        &app,
        request(
            "POST",
            "/api/v1/guilds/1/events",
            Some(ADMIN),
            true,
            Some(json!({"name": "  ", "format": "swiss"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "invalid_request");
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let (app, _) = create_test_server();

    let mut lookup = get("/api/v1/guilds/1/events/42/standings");
    lookup
        .headers_mut()
        .insert("x-request-id", "standings-lookup-7".parse().unwrap());

    let response = app.oneshot(lookup).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-request-id"], "standings-lookup-7");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["code"], "not_found");
    assert_eq!(error["request_id"], "standings-lookup-7");
}

#[tokio::test]
async fn test_swiss_event_through_http() {
    let (app, ledger) = create_test_server();
    let id = create_event(
        &app,
        json!({"name": "League", "prize_pool": 40, "format": "swiss", "total_rounds": 1}),
    )
    .await;
    let base = format!("/api/v1/guilds/1/events/{id}");

    for member in [10, 11, 12, 13] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                &format!("{base}/participants"),
                Some(ADMIN),
                true,
                Some(json!({"participant": member})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, pairing) = send(&app, admin_post(&format!("{base}/pairings"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pairing["round_number"], 1);
    assert_eq!(pairing["round"][0]["player1"], 10);
    assert_eq!(pairing["round"][0]["player2"], 11);

    let (status, error) = send(&app, admin_post(&format!("{base}/pairings"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "round_in_progress");

    let (status, error) = send(
        &app,
        admin_post(&format!("{base}/win"), Some(json!({"participant": 99}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "not_playing");

    let (_, first) = send(
        &app,
        admin_post(&format!("{base}/win"), Some(json!({"participant": 10}))),
    )
    .await;
    assert_eq!(first["outcome"]["round_complete"], false);

    let (status, last) = send(
        &app,
        admin_post(&format!("{base}/win"), Some(json!({"participant": 13}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["outcome"]["completion"]["placements"]["first"], 10);
    assert_eq!(last["payouts"]["credited"].as_array().unwrap().len(), 3);
    assert_eq!(ledger.balance(1, 10).await, 40);

    let (status, standings) = send(&app, get(&format!("{base}/standings"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings["active"], false);
    assert_eq!(standings["standings"][0]["participant"], 10);

    let (status, bracket) = send(&app, get(&format!("{base}/bracket"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bracket["matches"].as_array().unwrap().len(), 2);

    let (status, error) = send(&app, admin_post(&format!("{base}/pairings"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "tournament_complete");
}

#[tokio::test]
async fn test_finish_pays_whole_pool() {
    let (app, ledger) = create_test_server();
    let id = create_event(
        &app,
        json!({"name": "Cup", "prize_pool": 75, "format": "elimination"}),
    )
    .await;

    let (status, report) = send(
        &app,
        request(
            "POST",
            &format!("/api/v1/guilds/1/events/{id}/finish"),
            Some(ADMIN),
            true,
            Some(json!({"participant": 5})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["outcome"]["prize"], 75);
    assert_eq!(ledger.balance(1, 5).await, 75);

    let (status, _) = send(&app, join(id, 6)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, get("/api/v1/guilds/1/events")).await;
    assert!(list.as_array().unwrap().is_empty());
}
