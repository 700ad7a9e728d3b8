//! End-to-end API tests against PostgreSQL.
//!
//! Run with `cargo test -p quire-api -- --ignored`.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use quire_api::{router, AppConfig, AppState};
use quire_db::test_fixtures::{test_database, TestData};

async fn send(app: &Router, method: &str, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        "",
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_note_lifecycle_over_http() {
    let db = test_database().await;
    let data = TestData::new(&db).await;
    let app = router(AppState::new(db.clone(), AppConfig::default()));
    let token = login(&app, &data.user.email, "fixture-password").await;
    let tag = data.tag("http");

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/notes",
        &token,
        Some(json!({
            "title": format!("Deploy {}", data.suffix),
            "body": "# Test Content\n\nThis is a test.<script>alert(1)</script>",
            "tags": format!("{}, {}", tag.to_uppercase(), tag),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["tags"].as_array().unwrap().len(), 1);
    let html = created["body_html"].as_str().unwrap();
    assert!(html.contains("<h1"));
    assert!(html.contains("<p>This is a test."));
    assert!(!html.contains("<script"));

    let (status, found) = send(&app, "GET", &format!("/api/v1/notes?tag={}", tag), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["total"], 1);
    assert_eq!(found["mode"], "sorted");

    let id = created["id"].as_str().unwrap();
    let (status, toggled) = send(&app, "POST", &format!("/api/v1/notes/{}/archive", id), &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["archived"], true);

    let (_, hidden) = send(&app, "GET", &format!("/api/v1/notes?tag={}", tag), &token, None).await;
    assert_eq!(hidden["total"], 0);
    assert_eq!(hidden["message"], "No notes found");

    let (_, shown) = send(
        &app,
        "GET",
        &format!("/api/v1/notes?tag={}&archived=1", tag),
        &token,
        None,
    )
    .await;
    assert_eq!(shown["total"], 1);

    let tag_id = created["tags"][0]["id"].as_i64().unwrap();
    let (status, err) = send(&app, "DELETE", &format!("/api/v1/tags/{}", tag_id), &token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("used by 1 note(s)"));

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/notes/{}", id), &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/api/v1/tags/{}", tag_id), &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_non_admin_forbidden_and_logout_ends_session() {
    let db = test_database().await;
    let data = TestData::new(&db).await;
    let app = router(AppState::new(db.clone(), AppConfig::default()));
    let token = login(&app, &data.user.email, "fixture-password").await;

    let (status, _) = send(&app, "GET", "/api/v1/admin/users", &token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = send(&app, "GET", "/api/v1/auth/me", &token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], data.user.email.as_str());
    assert!(me.get("password_hash").is_none());

    let (status, _) = send(&app, "POST", "/api/v1/auth/logout", &token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", &token, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_wrong_password_rejected() {
    let db = test_database().await;
    let data = TestData::new(&db).await;
    let app = router(AppState::new(db.clone(), AppConfig::default()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        "",
        Some(json!({"email": data.user.email, "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_login_purges_expired_sessions() {
    use quire_core::SessionRepository;

    let db = test_database().await;
    let data = TestData::new(&db).await;
    db.sessions
        .create(data.user.id, chrono::Duration::seconds(-60))
        .await
        .unwrap();
    let app = router(AppState::new(db.clone(), AppConfig::default()));

    login(&app, &data.user.email, "fixture-password").await;

    let expired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_session WHERE user_id = $1 AND expires_at_utc <= NOW()",
    )
    .bind(data.user.id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(expired, 0);
}
