use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mmcalc::api::{self, AppState};
use mmcalc::db::init_db;
use mmcalc::orchestration::{Autosaver, SessionManager};
use mmcalc::persistence::{AllowAllGate, MemoryStore, SqliteGate, SqliteStore};
use mmcalc::Repository;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

fn open_app() -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(10));
    let manager = Arc::new(SessionManager::new(
        store,
        Arc::new(AllowAllGate),
        autosaver,
    ));
    api::create_router(AppState { manager })
}

async fn enforced_app() -> (axum::Router, Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let store = Arc::new(SqliteStore::new(repo.clone()));
    let autosaver = Autosaver::spawn(store.clone(), Duration::from_millis(10));
    let manager = Arc::new(SessionManager::new(
        store,
        Arc::new(SqliteGate::new(repo.clone())),
        autosaver,
    ));
    (api::create_router(AppState { manager }), repo, temp_dir)
}

fn params_json() -> Value {
    json!({
        "nTrades": 7,
        "lossCapturePct": 0.5,
        "profitCapturePct": 0.8,
        "leverage": 50.0,
        "feePct": 0.12
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_initialize_and_trade() {
    let app = open_app();

    let response = app
        .clone()
        .oneshot(post_empty("/v1/sessions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let key = body["sessionKey"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/sessions/{}/initialize", key),
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["initialized"], json!(true));
    assert_eq!(body["state"]["tradeCount"], json!(1));
    assert_eq!(body["state"]["rows"][0]["result"], json!("-"));
    assert!((body["coefficients"]["divisor"].as_f64().unwrap() - 65.0).abs() < 1e-3);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/sessions/{}/outcome", key),
            json!({"outcome": "win"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"]["tradeCount"], json!(2));
    assert_eq!(body["stats"]["wins"], json!(1));
    assert!(body["change"]["amount"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_outcome_before_initialize_is_conflict() {
    let app = open_app();
    let response = app
        .oneshot(post_json(
            "/v1/sessions/somebody/outcome",
            json!({"outcome": "loss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not initialized"));
}

#[tokio::test]
async fn test_initialize_rejects_bad_amount() {
    let app = open_app();
    let response = app
        .oneshot(post_json(
            "/v1/sessions/u1/initialize",
            json!({"initialAmount": -5.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_initialize_rejects_degenerate_params() {
    let app = open_app();
    let mut params = params_json();
    params["profitCapturePct"] = json!(0.12); // m == f
    let response = app
        .oneshot(post_json(
            "/v1/sessions/u1/initialize",
            json!({"initialAmount": 6500.0, "params": params}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undo_redo_endpoints() {
    let app = open_app();
    app.clone()
        .oneshot(post_json(
            "/v1/sessions/u1/initialize",
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/v1/sessions/u1/outcome",
            json!({"outcome": "win"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_empty("/v1/sessions/u1/undo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"]["tradeCount"], json!(1));
    assert_eq!(body["canRedo"], json!(true));

    let response = app
        .clone()
        .oneshot(post_empty("/v1/sessions/u1/redo"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["state"]["tradeCount"], json!(2));
    assert_eq!(body["canRedo"], json!(false));
}

#[tokio::test]
async fn test_fast_forward_endpoint() {
    let app = open_app();
    let response = app
        .oneshot(post_json(
            "/v1/sessions/u1/fast-forward",
            json!({
                "initialAmount": 6500.0,
                "params": params_json(),
                "targetSerial": 10
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"]["tradeCount"], json!(10));
    assert_eq!(body["stats"]["wins"], json!(9));
    assert_eq!(body["canUndo"], json!(false));
}

#[tokio::test]
async fn test_set_params_endpoint() {
    let app = open_app();
    app.clone()
        .oneshot(post_json(
            "/v1/sessions/u1/initialize",
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();

    let mut params = params_json();
    params["leverage"] = json!(25.0);
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/sessions/u1/params")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"params": params}).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["state"]["params"]["leverage"], json!(25.0));
    assert!((body["coefficients"]["q"].as_f64().unwrap() - 17.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_ledger_csv_export() {
    let app = open_app();
    app.clone()
        .oneshot(post_json(
            "/v1/sessions/u1/initialize",
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/v1/sessions/u1/outcome",
            json!({"outcome": "win"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/v1/sessions/u1/ledger.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "serial,tradeAmount,result,total,finalAmount");
    assert_eq!(lines.len(), 4); // header + settled + pending + footer
    assert!(lines[3].starts_with("change,"));
}

#[tokio::test]
async fn test_ledger_csv_requires_initialized_session() {
    let app = open_app();
    let response = app
        .oneshot(get("/v1/sessions/ghost/ledger.csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_entitlement_enforced_flow() {
    let (app, repo, _temp) = enforced_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/sessions/user-1/initialize",
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    repo.set_entitlement("user-1", true, None).await.unwrap();
    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/sessions/user-1/initialize",
            json!({"initialAmount": 6500.0, "params": params_json()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = open_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
