use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use gigbase_core::{RecordingImageStore, Stores};
use gigbase_server::{create_router, AppState};

/// Create a test app backed by in-memory collections.
fn create_test_app() -> Router {
    let state = AppState::new(Stores::in_memory(), Arc::new(RecordingImageStore::new()));
    create_router(state)
}

/// Helper to get response body as string.
async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(body: Body) -> Value {
    serde_json::from_str(&body_string(body).await).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = body_string(response.into_body()).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response.into_body()).await)
}

async fn delete(app: &Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

/// Create a validated genre and return its id.
async fn create_genre(app: &Router, name: &str) -> String {
    let (status, genre) = post(app, "/api/genres", json!({ "name": name })).await;
    assert_eq!(status, StatusCode::CREATED);
    genre["id"].as_str().unwrap().to_string()
}

async fn create(app: &Router, collection: &str, body: Value) -> String {
    let (status, created) = post(app, &format!("/api/{}", collection), body).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health endpoint tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response.into_body()).await;
    assert_eq!(body, r#"{"status":"ok"}"#);
}

// ============================================================================
// Collection routing tests
// ============================================================================

#[tokio::test]
async fn test_unknown_collection() {
    let app = create_test_app();

    let (status, body) = get(&app, "/api/concerts").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("concerts"));
}

#[tokio::test]
async fn test_get_missing_entry() {
    let app = create_test_app();

    let (status, body) = get(&app, "/api/bands/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// ============================================================================
// Create and list tests
// ============================================================================

#[tokio::test]
async fn test_create_band_and_list() {
    let app = create_test_app();
    let thrash = create_genre(&app, "Thrash Metal").await;

    let (status, band) = post(
        &app,
        "/api/unvalidated-bands",
        json!({ "name": "Kreator", "genre": [thrash] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(band["url"], "kreator");

    let (status, bands) = get(&app, "/api/unvalidated-bands").await;
    assert_eq!(status, StatusCode::OK);
    let bands = bands.as_array().unwrap();
    assert_eq!(bands.len(), 1);
    assert_eq!(bands[0]["name"], "Kreator");
    assert_eq!(bands[0]["genre"], json!(["Thrash Metal"]));
    assert_eq!(bands[0]["isValidated"], false);

    let (_, validated) = get(&app, "/api/bands").await;
    assert!(validated.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_sorted_descending() {
    let app = create_test_app();
    let thrash = create_genre(&app, "Thrash Metal").await;

    for name in ["Sodom", "Destruction", "Kreator"] {
        create(&app, "bands", json!({ "name": name, "genre": [thrash] })).await;
    }

    let (status, bands) = get(&app, "/api/bands?sortBy=name&order=desc").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = bands
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Sodom", "Kreator", "Destruction"]);
}

#[tokio::test]
async fn test_invalid_band_rejected() {
    let app = create_test_app();

    let (status, body) = post(
        &app,
        "/api/bands",
        json!({ "name": "Tankard", "genre": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, bands) = get(&app, "/api/bands").await;
    assert!(bands.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_event_with_missing_location_shows_sentinel() {
    let app = create_test_app();
    let thrash = create_genre(&app, "Thrash Metal").await;
    let band = create(&app, "bands", json!({ "name": "Assassin", "genre": [thrash] })).await;

    let event = create(
        &app,
        "unvalidated-events",
        json!({
            "name": "Thrash Assault",
            "location": "gone",
            "date": "2024-11-02",
            "bands": [band],
        }),
    )
    .await;

    let (status, view) = get(&app, &format!("/api/unvalidated-events/{}", event)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["location"], "Location not found");
    assert_eq!(view["verifiable"], false);
    assert_eq!(view["bands"][0]["name"], "Assassin");
}

// ============================================================================
// Delete tests
// ============================================================================

#[tokio::test]
async fn test_delete_band_updates_events() {
    let app = create_test_app();
    let thrash = create_genre(&app, "Thrash Metal").await;
    let location = create(
        &app,
        "locations",
        json!({ "name": "Zeche", "address": { "city": "Bochum" } }),
    )
    .await;
    let gone = create(&app, "bands", json!({ "name": "Holy Moses", "genre": [thrash] })).await;
    let kept = create(&app, "bands", json!({ "name": "Exumer", "genre": [thrash] })).await;

    let event = create(
        &app,
        "events",
        json!({
            "name": "Thrash Night",
            "location": location,
            "date": "2024-08-01",
            "bands": [gone, kept],
        }),
    )
    .await;

    assert_eq!(
        delete(&app, &format!("/api/bands/{}", gone)).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        delete(&app, &format!("/api/bands/{}", gone)).await,
        StatusCode::NOT_FOUND
    );

    let (_, view) = get(&app, &format!("/api/events/{}", event)).await;
    let bands = view["bands"].as_array().unwrap();
    assert_eq!(bands.len(), 1);
    assert_eq!(bands[0]["id"], kept.as_str());
    assert_eq!(view["verifiable"], true);
}

// ============================================================================
// Moderation tests
// ============================================================================

#[tokio::test]
async fn test_validate_band_promotes_and_rewrites() {
    let app = create_test_app();
    let thrash = create_genre(&app, "Thrash Metal").await;
    let location = create(
        &app,
        "locations",
        json!({ "name": "Turock", "address": { "city": "Essen" } }),
    )
    .await;
    let band = create(
        &app,
        "unvalidated-bands",
        json!({ "name": "Vendetta", "genre": [thrash] }),
    )
    .await;

    let (_, event) = post(
        &app,
        "/api/events",
        json!({
            "name": "Ruhrpott Thrash",
            "location": location,
            "date": "2024-10-03",
            "bands": [band],
        }),
    )
    .await;
    assert_eq!(event["verifiable"], false);
    let event_id = event["id"].as_str().unwrap();

    let uri = format!("/api/unvalidated-bands/{}/validate", band);
    let (status, body) = post(&app, &uri, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let new_id = body["id"].as_str().unwrap();
    assert_ne!(new_id, band);

    let (status, _) = get(&app, &format!("/api/unvalidated-bands/{}", band)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, promoted) = get(&app, &format!("/api/bands/{}", new_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["isValidated"], true);
    assert_eq!(promoted["url"], "vendetta");

    let (_, view) = get(&app, &format!("/api/events/{}", event_id)).await;
    assert_eq!(view["bands"][0]["id"], new_id);
    assert_eq!(view["verifiable"], true);
}

#[tokio::test]
async fn test_validate_requires_unvalidated_collection() {
    let app = create_test_app();

    let (status, _) = post(&app, "/api/bands/anything/validate", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/unvalidated-bands/anything/validate",
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
