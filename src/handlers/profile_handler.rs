use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::db::helpers::{db_result, require_record};
use crate::db::profiles::{get_profile, update_profile};
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::profile::UpdateProfileRequest;
use crate::ok_or_return;

#[tracing::instrument(name = "Get profile", skip(pool, claims), fields(username = %claims.username))]
pub async fn get_user_profile(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let profile = ok_or_return!(require_record(get_profile(&pool, user_id).await, "Profile not found"));

    HttpResponse::Ok().json(ApiResponse::success("Profile retrieved", profile))
}

#[tracing::instrument(name = "Update profile", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn update_user_profile(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    if let Err(message) = body.validate(Utc::now().date_naive()) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(message));
    }

    ok_or_return!(db_result(update_profile(&pool, user_id, &body).await));
    let profile = ok_or_return!(require_record(get_profile(&pool, user_id).await, "Profile not found"));

    tracing::info!("Profile updated");
    HttpResponse::Ok().json(ApiResponse::success("Profile updated", profile))
}
