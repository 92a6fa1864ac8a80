use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::jwt::JwtSettings;
use crate::db::users::find_by_username;
use crate::middleware::auth::issue_token;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::models::common::ApiResponse;
use crate::models::user::UserStatus;
use crate::utils::password::verify_password;

#[tracing::instrument(
    name = "Login user attempt",
    skip(login_form, pool, jwt_settings),
    fields(
        username = %login_form.username
    )
)]
pub async fn login_user(
    login_form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_settings: web::Data<JwtSettings>,
) -> HttpResponse {
    let invalid = || HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid username or password"));

    let user = match find_by_username(&pool, login_form.username.trim()).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::info!("User not found or invalid credentials");
            return invalid();
        }
        Err(e) => {
            tracing::error!("Database error occurred: {:?}", e);
            return HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"));
        }
    };

    if !verify_password(login_form.password.expose_secret(), &user.password_hash) {
        tracing::info!("Invalid password");
        return invalid();
    }

    if user.status != UserStatus::Active {
        tracing::info!("Login refused for inactive account");
        return HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Account is not active"));
    }

    match issue_token(&user, &jwt_settings) {
        Ok((token, expires_at)) => HttpResponse::Ok().json(ApiResponse::success(
            "Login successful",
            LoginResponse {
                token,
                user_id: user.id,
                expires_at,
            },
        )),
        Err(e) => {
            tracing::error!("Error generating JWT token: {:?}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to issue token"))
        }
    }
}
