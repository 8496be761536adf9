// End-to-end tests for the content API: full router, in-memory store.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

use revolution_archive::{api, AppState, Config};

const SECRET: &str = "test-secret";

fn test_app() -> Router {
    let conn = Connection::open_in_memory().unwrap();
    revolution_archive::setup_database(&conn).unwrap();

    let config = Config {
        admin_secret: SECRET.to_string(),
        database_path: ":memory:".into(),
        bind_addr: "127.0.0.1:0".to_string(),
        revolution_start: None,
        internet_shutdown_start: None,
    };

    api::router(AppState::new(conn, config))
}

async fn send(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

async fn create_person(app: &Router, name: &str, date: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/persons",
        Some(json!({ "name": name, "lastName": "R", "date": date })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    parse(&body)
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_create_warrior_assigns_id_and_nulls_optionals() {
    let app = test_app();
    let created = create_person(&app, "Ali", "2025-09-20").await;

    assert!(created["id"].as_i64().is_some());
    assert_eq!(created["name"], "Ali");
    assert_eq!(created["lastName"], "R");
    assert!(created["age"].is_null());
    assert!(created["picture"].is_null());
    assert_eq!(&created["date"].as_str().unwrap()[..10], "2025-09-20");
}

#[tokio::test]
async fn test_create_ids_unique() {
    let app = test_app();
    let a = create_person(&app, "A", "2025-01-01").await;
    let b = create_person(&app, "B", "2025-01-02").await;
    assert_ne!(a["id"], b["id"]);
}

#[tokio::test]
async fn test_roundtrip_by_id() {
    let app = test_app();
    let created = create_person(&app, "Ali", "2025-09-20").await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/persons/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), created);

    let (status, _) = send(&app, Method::GET, "/persons/999999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_missing_fields_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({ "name": "Ali", "date": "2025-09-20" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing required fields");

    // Empty string counts as missing too
    let (status, _) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({ "name": "", "lastName": "R", "date": "2025-09-20" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing reached the store
    let (_, body) = send(&app, Method::GET, "/persons", None, None).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn test_invalid_date_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({ "name": "Ali", "lastName": "R", "date": "soon after" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid date");
}

#[tokio::test]
async fn test_negative_age_rejected() {
    let app = test_app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({ "name": "Ali", "lastName": "R", "age": -3, "date": "2025-09-20" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mutations_fail_closed_without_credential() {
    let app = test_app();
    let payload = json!({ "name": "Ali", "lastName": "R", "date": "2025-09-20" });

    // Missing, wrong, and malformed credentials all reject
    let (status, body) =
        send(&app, Method::POST, "/persons", Some(payload.clone()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized");

    let (status, _) = send(
        &app,
        Method::POST,
        "/persons",
        Some(payload.clone()),
        Some("wrong-secret"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/persons")
        .header(header::AUTHORIZATION, SECRET) // no Bearer prefix
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::PUT, "/persons/1", Some(payload), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, "/persons/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The store was never touched
    let (_, body) = send(&app, Method::GET, "/persons", None, None).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn test_update_replaces_all_fields() {
    let app = test_app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({
            "name": "Ali",
            "lastName": "R",
            "age": 24,
            "picture": "https://img.example/a.jpg",
            "date": "2025-09-20"
        })),
        Some(SECRET),
    )
    .await;
    let id = parse(&body)["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/persons/{id}"),
        Some(json!({ "name": "Alieh", "lastName": "Renamed", "date": "2025-09-21" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated = parse(&body);
    assert_eq!(updated["id"].as_i64(), Some(id));
    assert_eq!(updated["name"], "Alieh");
    assert!(updated["age"].is_null(), "omitted age must be replaced, not kept");
    assert!(updated["picture"].is_null());
    assert_eq!(&updated["date"].as_str().unwrap()[..10], "2025-09-21");

    // Read-back agrees with the update response
    let (_, body) = send(&app, Method::GET, &format!("/persons/{id}"), None, None).await;
    assert_eq!(parse(&body), updated);
}

#[tokio::test]
async fn test_update_missing_id_is_internal_failure() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/persons/999999",
        Some(json!({ "name": "Ali", "lastName": "R", "date": "2025-09-20" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Failed to update warrior"), "got: {body}");
}

#[tokio::test]
async fn test_delete_idempotent() {
    let app = test_app();
    let created = create_person(&app, "Gone", "2025-01-01").await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/persons/{id}"), None, Some(SECRET)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleting again, or deleting something that never existed, still succeeds
    let (status, _) = send(&app, Method::DELETE, &format!("/persons/{id}"), None, Some(SECRET)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, "/persons/999999", None, Some(SECRET)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_persons_listed_by_event_date_desc() {
    let app = test_app();
    create_person(&app, "Mid", "2025-01-02").await;
    create_person(&app, "New", "2025-03-01").await;
    create_person(&app, "Old", "2024-12-25").await;

    let (_, body) = send(&app, Method::GET, "/persons", None, None).await;
    let persons = parse(&body);
    let names: Vec<String> = persons
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["New", "Mid", "Old"]);
}

#[tokio::test]
async fn test_crime_flag_defaults_false_and_drives_archive_view() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/news",
        Some(json!({
            "title": "documented crime",
            "description": "details",
            "date": "2025-02-01",
            "isCrime": true
        })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let crime_id = parse(&body)["id"].as_i64().unwrap();

    // isCrime omitted: normalized to a strict false, never null
    let (_, body) = send(
        &app,
        Method::POST,
        "/news",
        Some(json!({ "title": "plain", "description": "details", "date": "2025-02-02" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(parse(&body)["isCrime"], json!(false));

    // Both items are visible on the plain news listing, newest date first
    let (_, body) = send(&app, Method::GET, "/news", None, None).await;
    let all_news = parse(&body);
    assert_eq!(all_news.as_array().unwrap().len(), 2);
    assert_eq!(all_news[0]["title"], "plain");

    let (_, body) = send(&app, Method::GET, "/summary", None, None).await;
    let summary = parse(&body);
    let crime_ids: Vec<i64> = summary["latestCrimeNews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(crime_ids, vec![crime_id]);
}

#[tokio::test]
async fn test_archive_create_and_ordering() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/archive",
        Some(json!({ "title": "first", "description": "entry one" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first = parse(&body);
    assert!(first["createdAt"].as_str().is_some());

    let (_, body) = send(
        &app,
        Method::POST,
        "/archive",
        Some(json!({ "title": "second", "description": "entry two" })),
        Some(SECRET),
    )
    .await;
    let second = parse(&body);

    // Newest creation first
    let (_, body) = send(&app, Method::GET, "/archive", None, None).await;
    let ids: Vec<i64> = parse(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/archive",
        Some(json!({ "title": "no description" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/archive/999999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_site_info_upsert_keeps_singleton_identity() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/site-info", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "null");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/site-info",
        Some(json!({ "leaderName": "first leader" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/site-info",
        Some(json!({ "leaderName": "second leader", "afterRevolutionPlan": "the plan" })),
        Some(SECRET),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["id"].as_i64(), Some(1));

    let (_, body) = send(&app, Method::GET, "/site-info", None, None).await;
    let info = parse(&body);
    assert_eq!(info["id"].as_i64(), Some(1));
    assert_eq!(info["leaderName"], "second leader");
    assert_eq!(info["afterRevolutionPlan"], "the plan");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/site-info",
        Some(json!({ "leaderName": "intruder" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_summary_truncates_to_five_and_counts_all() {
    let app = test_app();
    for day in 1..=6 {
        create_person(&app, "W", &format!("2025-04-{day:02}")).await;
    }

    let (_, body) = send(&app, Method::GET, "/summary", None, None).await;
    let summary = parse(&body);

    assert_eq!(summary["latestWarriors"].as_array().unwrap().len(), 5);
    assert_eq!(summary["warriorCount"].as_i64(), Some(6));
    assert!(summary["daysSinceRevolution"].is_null());
    assert_eq!(
        &summary["latestWarriors"][0]["date"].as_str().unwrap()[..10],
        "2025-04-06"
    );
}

#[tokio::test]
async fn test_empty_picture_stored_as_null() {
    let app = test_app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({ "name": "Ali", "lastName": "R", "picture": "", "date": "2025-09-20" })),
        Some(SECRET),
    )
    .await;
    assert!(parse(&body)["picture"].is_null());
}

#[tokio::test]
async fn test_long_iso_date_truncates_to_calendar_date() {
    let app = test_app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/persons",
        Some(json!({
            "name": "Ali",
            "lastName": "R",
            "date": "2025-09-20T18:30:00.000Z"
        })),
        Some(SECRET),
    )
    .await;
    assert_eq!(parse(&body)["date"], "2025-09-20T00:00:00.000Z");
}
