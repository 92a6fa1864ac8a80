use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::db::helpers::is_unique_violation;
use crate::db::users::{insert_user, username_or_email_taken};
use crate::models::common::ApiResponse;
use crate::models::user::{RegistrationRequest, RegistrationResponse};
use crate::utils::password::hash_password;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;

fn validate_registration(form: &RegistrationRequest) -> Result<(), String> {
    let username_len = form.username.trim().chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&username_len) {
        return Err(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        ));
    }
    let email = form.email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err("Email address is invalid".to_string());
    }
    if form.password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    Ok(())
}

#[tracing::instrument(
    name = "Adding a new user",
    skip(user_form, pool),
    fields(
        username = %user_form.username,
        email = %user_form.email
    )
)]
pub async fn register_user(
    user_form: web::Json<RegistrationRequest>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    if let Err(message) = validate_registration(&user_form) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(message));
    }

    let username = user_form.username.trim();
    let email = user_form.email.trim().to_lowercase();

    match username_or_email_taken(&pool, username, &email).await {
        Ok(true) => {
            tracing::info!("Username or email already registered");
            return HttpResponse::Conflict()
                .json(ApiResponse::<()>::error("Username or email already registered"));
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check existing users: {}", e);
            return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"));
        }
    }

    let password_hash = match hash_password(user_form.password.expose_secret()) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to register user"));
        }
    };

    match insert_user(&pool, username, &email, &password_hash).await {
        Ok(user_id) => {
            tracing::info!("Registered user {}", user_id);
            HttpResponse::Created().json(ApiResponse::success(
                "User registered",
                RegistrationResponse {
                    user_id,
                    username: username.to_string(),
                },
            ))
        }
        // Lost a race against a concurrent registration
        Err(e) if is_unique_violation(&e) => HttpResponse::Conflict()
            .json(ApiResponse::<()>::error("Username or email already registered")),
        Err(e) => {
            tracing::error!("Failed to register user: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to register user"))
        }
    }
}
