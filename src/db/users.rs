use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserRole, UserStatus};

pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<Uuid, sqlx::Error> {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    // User and profile rows are created together
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(UserRole::User.to_string())
    .bind(UserStatus::Active.to_string())
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute user insert query: {:?}", e);
        e
    })?;

    sqlx::query("INSERT INTO user_profiles (user_id, updated_at) VALUES ($1, $2)")
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute profile insert query: {:?}", e);
            e
        })?;

    tx.commit().await?;
    Ok(user_id)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn username_or_email_taken(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<bool, sqlx::Error> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR lower(email) = lower($2))",
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// Whether the user wants notification emails.
pub async fn wants_email(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let wants: Option<bool> = sqlx::query_scalar(
        "SELECT email_notifications FROM user_profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(wants.unwrap_or(false))
}
