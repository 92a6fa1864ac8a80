use reqwest::{multipart, Client, Method};
use serde_json::json;
use uuid::Uuid;

mod common;
use common::utils::{create_test_user_and_login, make_authenticated_request, post_reading, spawn_app};

#[tokio::test]
async fn create_reading_returns_good_analysis() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    let body = post_reading(
        &test_app.address,
        &user.token,
        json!({
            "device_id": "watch-1",
            "recorded_at": "2025-03-14T07:30:00Z",
            "heart_rate": 68.0,
            "spo2": 98.0,
            "temperature": 36.6
        }),
    )
    .await;

    let reading = &body["data"]["reading"];
    assert_eq!(reading["device_id"], "watch-1");
    assert_eq!(reading["source"], "api");
    assert_eq!(reading["heart_rate"], 68.0);
    assert!(reading["steps"].is_null());

    let analysis = &body["data"]["analysis"];
    assert_eq!(analysis["risk_level"], "good");
    assert_eq!(analysis["health_data_id"], reading["id"]);
    assert_eq!(analysis["findings"].as_array().map(|f| f.len()), Some(3));

    // A good reading raises no alert
    let alerts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert_eq!(alerts, 0);
}

#[tokio::test]
async fn bad_reading_raises_risk_alert() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    let body = post_reading(
        &test_app.address,
        &user.token,
        json!({ "heart_rate": 135.0, "spo2": 88.0 }),
    )
    .await;
    assert_eq!(body["data"]["analysis"]["risk_level"], "bad");
    let analysis_id = body["data"]["analysis"]["id"].as_str().unwrap().to_string();

    let (notification_type, related_id, email_requested): (String, Option<Uuid>, bool) = sqlx::query_as(
        "SELECT notification_type, related_id, email_requested FROM notifications WHERE user_id = $1",
    )
    .bind(user.user_id)
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Expected one risk alert");

    assert_eq!(notification_type, "risk_alert");
    assert_eq!(related_id.map(|id| id.to_string()), Some(analysis_id));
    assert!(email_requested);
}

#[tokio::test]
async fn invalid_readings_are_rejected() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();
    let url = format!("{}/health/data", &test_app.address);

    for body in [
        json!({ "device_id": "watch-1" }),
        json!({ "heart_rate": 400.0 }),
        json!({ "spo2": 120.0 }),
    ] {
        let response = make_authenticated_request(&client, Method::POST, &url, &user.token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "expected 400 for {}", body);
    }
}

#[tokio::test]
async fn list_readings_is_paginated_and_filtered() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    for day in 10..15 {
        post_reading(
            &test_app.address,
            &user.token,
            json!({ "recorded_at": format!("2025-03-{}T08:00:00Z", day), "heart_rate": 70.0 }),
        )
        .await;
    }

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/data?page=1&per_page=2", &test_app.address),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 5);
    assert_eq!(body["data"]["per_page"], 2);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Newest first
    assert_eq!(items[0]["recorded_at"], "2025-03-14T08:00:00Z");

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!(
            "{}/health/data?from=2025-03-11T00:00:00Z&to=2025-03-12T23:59:59Z",
            &test_app.address
        ),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!(
            "{}/health/data?from=2025-03-12T00:00:00Z&to=2025-03-11T00:00:00Z",
            &test_app.address
        ),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn readings_of_other_users_are_not_found() {
    let test_app = spawn_app().await;
    let owner = create_test_user_and_login(&test_app.address).await;
    let other = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let body = post_reading(&test_app.address, &owner.token, json!({ "heart_rate": 72.0 })).await;
    let reading_id = body["data"]["reading"]["id"].as_str().unwrap().to_string();
    let url = format!("{}/health/data/{}", &test_app.address, reading_id);

    let response = make_authenticated_request(&client, Method::GET, &url, &other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = make_authenticated_request(&client, Method::DELETE, &url, &other.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = make_authenticated_request(&client, Method::GET, &url, &owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["analysis"]["risk_level"], "good");
}

#[tokio::test]
async fn deleting_a_reading_removes_its_analysis() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let body = post_reading(&test_app.address, &user.token, json!({ "heart_rate": 72.0 })).await;
    let reading_id = body["data"]["reading"]["id"].as_str().unwrap().to_string();
    let url = format!("{}/health/data/{}", &test_app.address, reading_id);

    let response = make_authenticated_request(&client, Method::DELETE, &url, &user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = make_authenticated_request(&client, Method::GET, &url, &user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let analyses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM health_analyses WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert_eq!(analyses, 0);
}

#[tokio::test]
async fn csv_upload_stores_valid_rows_and_reports_rejected_lines() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let csv = "recorded_at,heart_rate,steps,sleep_hours,calories,spo2,temperature,device_id\n\
               2025-03-10 07:00:00,64,,7.5,,98,36.6,watch-1\n\
               not-a-date,70,,,,,,\n\
               2025-03-11 07:00:00,,12000,,450,,,\n";
    let part = multipart::Part::bytes(csv.as_bytes().to_vec())
        .file_name("readings.csv")
        .mime_str("text/csv")
        .unwrap();
    let form = multipart::Form::new().part("file", part);

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/data/upload", &test_app.address),
        &user.token,
    )
    .multipart(form)
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["imported"], 2);
    assert_eq!(body["data"]["not_stored"], 0);
    let rejected = body["data"]["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["line"], 3);

    let (stored, analyzed): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT h.id), COUNT(a.id)
        FROM health_data h LEFT JOIN health_analyses a ON a.health_data_id = h.id
        WHERE h.user_id = $1 AND h.source = 'upload'
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();
    assert_eq!(stored, 2);
    assert_eq!(analyzed, 2);
}

#[tokio::test]
async fn upload_interrupted_by_database_error_reports_stored_rows() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    // Make the database refuse one particular reading
    sqlx::query(
        r#"
        CREATE FUNCTION refuse_heart_rate_99() RETURNS trigger AS $$
        BEGIN
            IF NEW.heart_rate = 99 THEN
                RAISE EXCEPTION 'refused reading';
            END IF;
            RETURN NEW;
        END
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&test_app.db_pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER refuse_heart_rate_99 BEFORE INSERT ON health_data \
         FOR EACH ROW EXECUTE FUNCTION refuse_heart_rate_99()",
    )
    .execute(&test_app.db_pool)
    .await
    .unwrap();

    let csv = "recorded_at,heart_rate\n\
               2025-03-10 07:00:00,64\n\
               not-a-date,70\n\
               2025-03-11 07:00:00,99\n\
               2025-03-12 07:00:00,66\n";
    let part = multipart::Part::bytes(csv.as_bytes().to_vec())
        .file_name("readings.csv")
        .mime_str("text/csv")
        .unwrap();
    let form = multipart::Form::new().part("file", part);

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/data/upload", &test_app.address),
        &user.token,
    )
    .multipart(form)
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["imported"], 1);
    assert_eq!(body["data"]["not_stored"], 2);
    assert_eq!(body["data"]["rejected"][0]["line"], 3);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM health_data WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&test_app.db_pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[tokio::test]
async fn upload_rejects_non_csv_files() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let part = multipart::Part::bytes(b"hello".to_vec()).file_name("notes.txt");
    let form = multipart::Form::new().part("file", part);

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/data/upload", &test_app.address),
        &user.token,
    )
    .multipart(form)
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn reanalyze_and_filter_analyses_by_risk() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let good = post_reading(&test_app.address, &user.token, json!({ "heart_rate": 72.0 })).await;
    post_reading(&test_app.address, &user.token, json!({ "heart_rate": 110.0 })).await;
    post_reading(&test_app.address, &user.token, json!({ "heart_rate": 140.0 })).await;

    let reading_id = good["data"]["reading"]["id"].as_str().unwrap();
    let first_analysis_id = good["data"]["analysis"]["id"].as_str().unwrap();

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/health/data/{}/analyze", &test_app.address, reading_id),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    // One analysis per reading, replaced in place
    assert_eq!(body["data"]["id"], first_analysis_id);
    assert_eq!(body["data"]["risk_level"], "good");

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/data/{}/analysis", &test_app.address, reading_id),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/analyses", &test_app.address),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 3);

    for (risk, expected) in [("good", 1), ("normal", 1), ("bad", 1)] {
        let response = make_authenticated_request(
            &client,
            Method::GET,
            &format!("{}/health/analyses?risk_level={}", &test_app.address, risk),
            &user.token,
        )
        .send()
        .await
        .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["data"]["total"], expected, "wrong count for {}", risk);
        assert_eq!(body["data"]["items"][0]["risk_level"], risk);
    }
}

#[tokio::test]
async fn advice_falls_back_to_rules_without_a_model() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let body = post_reading(&test_app.address, &user.token, json!({ "heart_rate": 135.0 })).await;
    let analysis_id = body["data"]["analysis"]["id"].as_str().unwrap();
    let suggestion = body["data"]["analysis"]["suggestion"].as_str().unwrap().to_string();

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/analyses/{}/advice", &test_app.address, analysis_id),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["source"], "rules");
    assert_eq!(body["data"]["advice"], suggestion);
    assert_eq!(body["data"]["analysis_id"], analysis_id);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/analyses/{}/advice", &test_app.address, Uuid::new_v4()),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn page_far_past_the_end_is_empty() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    post_reading(&test_app.address, &user.token, json!({ "heart_rate": 72.0 })).await;

    for path in ["/health/data", "/health/analyses", "/health/summaries", "/notifications"] {
        let response = make_authenticated_request(
            &client,
            Method::GET,
            &format!("{}{}?page={}&per_page=100", &test_app.address, path, i64::MAX),
            &user.token,
        )
        .send()
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 200, "unexpected status for {}", path);
    }

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/data?page={}&per_page=100", &test_app.address, i64::MAX),
        &user.token,
    )
    .send()
    .await
    .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"].as_array().map(|i| i.len()), Some(0));
}
