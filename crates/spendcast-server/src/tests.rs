//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use spendcast_core::import::import_ledger;
use tower::ServiceExt;

fn setup_test_app() -> (Router, Database, i64) {
    let db = Database::in_memory().unwrap();
    let user_id = db.upsert_user("alice").unwrap();
    let forecaster = Forecaster::new(db.clone(), ForecastConfig::default()).unwrap();
    let app = create_router(db.clone(), forecaster, ServerConfig::default());
    (app, db, user_id)
}

/// Three months of ledger inside the current training window
///
/// Dates are 80, 45 and 10 days ago, which always fall in distinct months.
fn seed_ledger(db: &Database, user_id: i64) {
    let today = Utc::now().date_naive();
    let mut csv = String::from("date,kind,amount,category,description\n");
    for (days_ago, income, expense) in [
        (80, 2_000_000, 1_200_000),
        (45, 2_500_000, 1_400_000),
        (10, 3_000_000, 1_600_000),
    ] {
        let date = today - Duration::days(days_ago);
        csv.push_str(&format!("{},income,{},,Salary\n", date, income));
        csv.push_str(&format!("{},expense,{},Rent,\n", date, expense / 2));
        csv.push_str(&format!("{},expense,{},Food,\n", date, expense / 4));
        csv.push_str(&format!("{},expense,{},Food,\n", date, expense / 8));
        csv.push_str(&format!("{},expense,{},Transport,\n", date, expense / 8));
    }
    import_ledger(db, user_id, csv.as_bytes()).unwrap();
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
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

// ========== Health / Users ==========

#[tokio::test]
async fn test_health() {
    let (app, _, _) = setup_test_app();

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_users() {
    let (app, _, _) = setup_test_app();

    let response = app.oneshot(get("/api/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "alice");
}

#[tokio::test]
async fn test_cors_allows_configured_origin_only() {
    let db = Database::in_memory().unwrap();
    let forecaster = Forecaster::new(db.clone(), ForecastConfig::default()).unwrap();
    let config = ServerConfig {
        allowed_origins: vec!["http://localhost:5173".to_string()],
    };
    let app = create_router(db, forecaster, config);

    let request = |origin: &str| {
        Request::builder()
            .uri("/api/health")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(request("http://localhost:5173"))
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );

    let response = app.oneshot(request("http://evil.example")).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

// ========== Training ==========

#[tokio::test]
async fn test_train_without_data() {
    let (app, _, user_id) = setup_test_app();

    let response = app
        .oneshot(post_empty(&format!(
            "/api/users/{}/predictions/train",
            user_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "Not enough data to train the model. Need at least 3 months of data with 10+ expenses."
    );
}

#[tokio::test]
async fn test_train_success() {
    let (app, db, user_id) = setup_test_app();
    seed_ledger(&db, user_id);

    let response = app
        .clone()
        .oneshot(post_empty(&format!(
            "/api/users/{}/predictions/train",
            user_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Model trained successfully");
    assert_eq!(json["samples"], 3);

    let response = app
        .oneshot(get(&format!("/api/users/{}/predictions/model", user_id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["trained"], true);
    assert_eq!(json["backend"], "database");
    assert_eq!(
        json["model"]["storage_key"],
        format!("expense_model_{}", user_id)
    );
}

// ========== Prediction ==========

#[tokio::test]
async fn test_predict_untrained() {
    let (app, _, user_id) = setup_test_app();

    let response = app
        .oneshot(post_json(
            &format!("/api/users/{}/predictions/expenses", user_id),
            serde_json::json!({ "income": 2000000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["reason"], "ModelNotTrained");
}

#[tokio::test]
async fn test_predict_validation() {
    let (app, _, user_id) = setup_test_app();
    let uri = format!("/api/users/{}/predictions/expenses", user_id);

    for body in [
        serde_json::json!({}),
        serde_json::json!({ "income": -5 }),
        serde_json::json!({ "income": "plenty" }),
    ] {
        let response = app.clone().oneshot(post_json(&uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = get_body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["reason"], "ValidationError");
    }

    // Not JSON at all
    let response = app.oneshot(post_empty(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["reason"], "ValidationError");
}

#[tokio::test]
async fn test_train_then_predict() {
    let (app, db, user_id) = setup_test_app();
    seed_ledger(&db, user_id);

    let response = app
        .clone()
        .oneshot(post_empty(&format!(
            "/api/users/{}/predictions/train",
            user_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/users/{}/predictions/expenses", user_id),
            serde_json::json!({ "income": 2750000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    let predicted = json["predicted_expense"].as_f64().unwrap();
    assert!((predicted - 1_500_000.0).abs() < 1e-3);
    assert_eq!(json["income"], 2_750_000.0);
    // Window income is 7.5M, so no insights for the 2M-5M bracket
    assert_eq!(json["insights_available"], false);
    assert!(json.get("insights").is_none());

    let response = app
        .oneshot(post_json(
            &format!("/api/users/{}/predictions/expenses", user_id),
            serde_json::json!({ "income": 6000000 }),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["insights_available"], true);
    assert_eq!(json["insights"]["income_bracket"], "5000000-10000000");
    assert_eq!(
        json["insights"]["category_insights"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

// ========== Insights / Model ==========

#[tokio::test]
async fn test_list_insights() {
    let (app, db, user_id) = setup_test_app();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/predictions/insights", user_id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["insights"].as_array().unwrap().is_empty());

    seed_ledger(&db, user_id);
    app.clone()
        .oneshot(post_empty(&format!(
            "/api/users/{}/predictions/train",
            user_id
        )))
        .await
        .unwrap();

    let response = app
        .oneshot(get(&format!("/api/users/{}/predictions/insights", user_id)))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    let insights = json["insights"].as_array().unwrap();
    assert_eq!(insights.len(), 3);
    assert_eq!(insights[0]["category"], "Food");
    assert_eq!(insights[0]["income_bracket"], "5000000-10000000");
}

#[tokio::test]
async fn test_model_status() {
    let (app, _, user_id) = setup_test_app();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/users/{}/predictions/model", user_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["trained"], false);
    assert!(json.get("model").is_none());

    let response = app
        .oneshot(get("/api/users/999/predictions/model"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
