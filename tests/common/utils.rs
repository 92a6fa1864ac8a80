#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde_json::json;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use pulsewise_backend::config::advice::AdviceSettings;
use pulsewise_backend::config::email::EmailSettings;
use pulsewise_backend::config::settings::{get_config, get_jwt_settings, DatabaseSettings};
use pulsewise_backend::run;
use pulsewise_backend::services::import_service::ImportTarget;
use pulsewise_backend::services::sheets_client::ImportError;
use pulsewise_backend::services::{AdviceService, EmailService, SheetSource};
use pulsewise_backend::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

pub struct TestUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_import(None).await
}

pub async fn spawn_app_with_import(import_target: Option<ImportTarget>) -> TestApp {
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_config().expect("Failed to read configuration.");
    // Fresh database per test
    configuration.database.db_name = Uuid::new_v4().to_string();
    configuration.database.db_url = None;
    let connection_pool = configure_db(&configuration.database).await;

    let jwt_settings = get_jwt_settings(&configuration);
    let email_service = EmailService::new(&EmailSettings::disabled()).expect("Failed to build email service");
    let advice_service = AdviceService::new(AdviceSettings::disabled()).expect("Failed to build advice service");

    let server = run(
        listener,
        connection_pool.clone(),
        jwt_settings,
        email_service,
        advice_service,
        import_target,
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_db(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(config.connection_string_without_db().expose_secret())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}

pub fn unique_username(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

pub async fn register_user(app_address: &str, username: &str, email: &str, password: &str) -> reqwest::Response {
    Client::new()
        .post(format!("{}/register_user", app_address))
        .json(&json!({
            "username": username,
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to register user.")
}

pub async fn login(app_address: &str, username: &str, password: &str) -> reqwest::Response {
    Client::new()
        .post(format!("{}/login", app_address))
        .json(&json!({
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to execute login request.")
}

pub async fn create_test_user_and_login(app_address: &str) -> TestUser {
    let username = unique_username("user");
    let email = format!("{}@example.com", username);
    let password = "password123".to_string();

    let register_response = register_user(app_address, &username, &email, &password).await;
    assert_eq!(register_response.status().as_u16(), 201, "registration failed");

    let login_response = login(app_address, &username, &password).await;
    assert!(login_response.status().is_success(), "login failed");
    let body: serde_json::Value = login_response.json().await.expect("Failed to parse login response");

    TestUser {
        user_id: body["data"]["user_id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("No user id in response"),
        username,
        email,
        password,
        token: body["data"]["token"].as_str().expect("No token in response").to_string(),
    }
}

/// Register a user, promote them to admin and log in again so the token carries the role.
pub async fn create_admin_user_and_login(app: &TestApp) -> TestUser {
    let user = create_test_user_and_login(&app.address).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user.user_id)
        .execute(&app.db_pool)
        .await
        .expect("Failed to promote user");

    let login_response = login(&app.address, &user.username, &user.password).await;
    let body: serde_json::Value = login_response.json().await.expect("Failed to parse login response");
    TestUser {
        token: body["data"]["token"].as_str().expect("No token in response").to_string(),
        ..user
    }
}

pub async fn set_email_notifications(pool: &PgPool, user_id: Uuid, enabled: bool) {
    sqlx::query("UPDATE user_profiles SET email_notifications = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(enabled)
        .execute(pool)
        .await
        .expect("Failed to update email preference");
}

pub fn make_authenticated_request(
    client: &Client,
    method: Method,
    url: &str,
    token: &str,
) -> RequestBuilder {
    client.request(method, url).header("Authorization", format!("Bearer {}", token))
}

/// POST a reading and return the response body.
pub async fn post_reading(app_address: &str, token: &str, reading: serde_json::Value) -> serde_json::Value {
    let client = Client::new();
    let response = make_authenticated_request(&client, Method::POST, &format!("{}/health/data", app_address), token)
        .json(&reading)
        .send()
        .await
        .expect("Failed to post reading");
    assert_eq!(response.status().as_u16(), 201, "reading was not stored");
    response.json().await.expect("Failed to parse reading response")
}


/// In-memory spreadsheet. `rows[0]` is sheet row 2, right below the header.
#[derive(Default)]
pub struct MemorySheet {
    pub id: String,
    pub rows: Mutex<Vec<Vec<String>>>,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<&str>>) -> Arc<Self> {
        Arc::new(Self {
            id: format!("memory:{}", Uuid::new_v4()),
            rows: Mutex::new(rows.into_iter().map(to_row).collect()),
        })
    }

    pub fn push(&self, row: Vec<&str>) {
        self.rows.lock().unwrap().push(to_row(row));
    }
}

fn to_row(cells: Vec<&str>) -> Vec<String> {
    cells.into_iter().map(str::to_string).collect()
}

#[async_trait]
impl SheetSource for MemorySheet {
    fn source_id(&self) -> String {
        self.id.clone()
    }

    async fn fetch_rows(&self, start_row: i64, limit: u32) -> Result<Vec<Vec<String>>, ImportError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .skip((start_row - 2).max(0) as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
