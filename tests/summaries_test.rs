use chrono::NaiveDate;
use reqwest::{Client, Method};
use serde_json::json;

use pulsewise_backend::db::summaries::latest_summary;
use pulsewise_backend::models::analysis::RiskLevel;
use pulsewise_backend::services::summary_service::generate_summary;

mod common;
use common::utils::{create_test_user_and_login, make_authenticated_request, post_reading, spawn_app};

#[tokio::test]
async fn generate_summary_for_requested_week() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    post_reading(
        &test_app.address,
        &user.token,
        json!({ "recorded_at": "2025-03-10T08:00:00Z", "heart_rate": 70.0, "steps": 12000 }),
    )
    .await;
    post_reading(
        &test_app.address,
        &user.token,
        json!({ "recorded_at": "2025-03-12T08:00:00Z", "heart_rate": 80.0, "sleep_hours": 7.5 }),
    )
    .await;
    // Next week, not part of the summary
    post_reading(
        &test_app.address,
        &user.token,
        json!({ "recorded_at": "2025-03-17T08:00:00Z", "heart_rate": 140.0 }),
    )
    .await;

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/summaries/generate", &test_app.address),
        &user.token,
    )
    .json(&json!({ "week_of": "2025-03-13" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let summary = &body["data"];
    assert_eq!(summary["period_start"], "2025-03-10T00:00:00Z");
    assert_eq!(summary["period_end"], "2025-03-17T00:00:00Z");
    assert_eq!(summary["reading_count"], 2);
    assert_eq!(summary["avg_heart_rate"], 75.0);
    assert_eq!(summary["min_heart_rate"], 70.0);
    assert_eq!(summary["max_heart_rate"], 80.0);
    assert_eq!(summary["total_steps"], 12000);
    assert_eq!(summary["good_count"], 2);
    assert_eq!(summary["bad_count"], 0);
    assert_eq!(summary["risk_level"], "good");

    // Regenerating the same week replaces the stored summary
    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/summaries/generate", &test_app.address),
        &user.token,
    )
    .json(&json!({ "week_of": "2025-03-10" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let again: serde_json::Value = response.json().await.unwrap();
    assert_eq!(again["data"]["id"], summary["id"]);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/summaries", &test_app.address),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/summaries/latest", &test_app.address),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["id"], summary["id"]);
}

#[tokio::test]
async fn week_without_readings_has_no_summary() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/summaries/latest", &test_app.address),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/summaries/generate", &test_app.address),
        &user.token,
    )
    .json(&json!({ "week_of": "2024-01-03" }))
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn stored_summary_risk_is_typed() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    post_reading(
        &test_app.address,
        &user.token,
        json!({ "recorded_at": "2025-03-11T08:00:00Z", "heart_rate": 140.0 }),
    )
    .await;

    let week_of = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let generated = generate_summary(&test_app.db_pool, user.user_id, week_of)
        .await
        .unwrap()
        .expect("week has readings");
    assert_eq!(generated.risk_level, Some(RiskLevel::Bad));

    let stored = latest_summary(&test_app.db_pool, user.user_id).await.unwrap().unwrap();
    assert_eq!(stored.id, generated.id);
    assert_eq!(stored.risk_level, Some(RiskLevel::Bad));

    let missing: Option<RiskLevel> = sqlx::query_scalar("SELECT NULL::TEXT")
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert_eq!(missing, None);

    let unknown = sqlx::query_scalar::<_, Option<RiskLevel>>("SELECT 'awful'::TEXT")
        .fetch_one(&test_app.db_pool)
        .await;
    assert!(unknown.is_err());
}
