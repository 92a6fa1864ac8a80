use reqwest::{Client, Method};
use serde_json::json;

mod common;
use common::utils::{
    create_test_user_and_login, login, make_authenticated_request, register_user, spawn_app, unique_username,
};

#[tokio::test]
async fn register_user_working() {
    let test_app = spawn_app().await;
    let username = unique_username("reg");
    let email = format!("{}@Example.com", username);

    let response = register_user(&test_app.address, &username, &email, "password123").await;
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], username);

    let (saved_username, saved_email, role, status): (String, String, String, String) =
        sqlx::query_as("SELECT username, email, role, status FROM users WHERE username = $1")
            .bind(&username)
            .fetch_one(&test_app.db_pool)
            .await
            .expect("Failed to fetch saved user.");

    assert_eq!(saved_username, username);
    assert_eq!(saved_email, email.to_lowercase());
    assert_eq!(role, "user");
    assert_eq!(status, "active");

    // A default profile row is created alongside the user
    let profiles: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_profiles p JOIN users u ON u.id = p.user_id WHERE u.username = $1",
    )
    .bind(&username)
    .fetch_one(&test_app.db_pool)
    .await
    .unwrap();
    assert_eq!(profiles, 1);
}

#[tokio::test]
async fn duplicate_username_or_email_is_conflict() {
    let test_app = spawn_app().await;
    let username = unique_username("dup");
    let email = format!("{}@example.com", username);

    let first = register_user(&test_app.address, &username, &email, "password123").await;
    assert_eq!(first.status().as_u16(), 201);

    let same_name = register_user(&test_app.address, &username, "other@example.com", "password123").await;
    assert_eq!(same_name.status().as_u16(), 409);

    let same_email = register_user(&test_app.address, &unique_username("dup"), &email.to_uppercase(), "password123").await;
    assert_eq!(same_email.status().as_u16(), 409);
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let test_app = spawn_app().await;

    let cases = [
        ("ab", "ab@example.com", "password123", "username too short"),
        ("validname", "not-an-email", "password123", "email without @"),
        ("validname", "valid@example.com", "short", "password too short"),
    ];

    for (username, email, password, case) in cases {
        let response = register_user(&test_app.address, username, email, password).await;
        assert_eq!(response.status().as_u16(), 400, "expected 400 for {}", case);
    }

    let response = Client::new()
        .post(format!("{}/register_user", &test_app.address))
        .json(&json!({ "username": "missingfields" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_returns_token_with_expiry() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    let response = login(&test_app.address, &user.username, &user.password).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["data"]["token"].as_str().map(|t| !t.is_empty()).unwrap_or(false));
    assert_eq!(body["data"]["user_id"], user.user_id.to_string());
    assert!(body["data"]["expires_at"].is_string());
}

#[tokio::test]
async fn login_with_wrong_password_or_unknown_user_fails() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    let response = login(&test_app.address, &user.username, "wrong-password").await;
    assert_eq!(response.status().as_u16(), 401);

    let response = login(&test_app.address, "nobodyatall", "password123").await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn inactive_user_cannot_log_in() {
    let test_app = spawn_app().await;
    let user = create_test_user_and_login(&test_app.address).await;

    sqlx::query("UPDATE users SET status = 'inactive' WHERE id = $1")
        .bind(user.user_id)
        .execute(&test_app.db_pool)
        .await
        .unwrap();

    let response = login(&test_app.address, &user.username, &user.password).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/profile", &test_app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = make_authenticated_request(
        &client,
        Method::GET,
        &format!("{}/health/data", &test_app.address),
        "not.a.token",
    )
    .send()
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}
