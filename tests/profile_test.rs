use reqwest::{Client, Method};
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, make_authenticated_request, spawn_app};

#[tokio::test]
async fn new_user_has_default_profile() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();

    let response = make_authenticated_request(&client, Method::GET, &format!("{}/profile", &test_app.address), &user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let profile = &body["data"];
    assert_eq!(profile["username"], user.username);
    assert_eq!(profile["email"], user.email);
    assert_eq!(profile["email_notifications"], true);
    assert!(profile["full_name"].is_null());
    assert!(profile["height_cm"].is_null());
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();
    let url = format!("{}/profile", &test_app.address);

    let response = make_authenticated_request(&client, Method::PUT, &url, &user.token)
        .json(&json!({
            "full_name": "Ada Lovelace",
            "date_of_birth": "1990-12-10",
            "gender": "female",
            "height_cm": 168.0,
            "weight_kg": 60.5
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = make_authenticated_request(&client, Method::PUT, &url, &user.token)
        .json(&json!({ "weight_kg": 62.0, "email_notifications": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let profile = &body["data"];
    assert_eq!(profile["full_name"], "Ada Lovelace");
    assert_eq!(profile["date_of_birth"], "1990-12-10");
    assert_eq!(profile["gender"], "female");
    assert_eq!(profile["height_cm"], 168.0);
    assert_eq!(profile["weight_kg"], 62.0);
    assert_eq!(profile["email_notifications"], false);
}

#[tokio::test]
async fn invalid_profile_values_are_rejected() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;
    let client = Client::new();
    let url = format!("{}/profile", &test_app.address);

    for body in [
        json!({ "height_cm": 20.0 }),
        json!({ "weight_kg": 999.0 }),
        json!({ "gender": "unknown" }),
        json!({ "date_of_birth": "2999-01-01" }),
    ] {
        let response = make_authenticated_request(&client, Method::PUT, &url, &user.token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "expected 400 for {}", body);
    }
}
