use actix_web::HttpResponse;
use uuid::Uuid;

use crate::db::helpers::DbResult;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;

pub mod admin_handler;
pub mod analysis_handler;
pub mod auth_handler;
pub mod backend_health_handler;
pub mod health_data;
pub mod notification_handler;
pub mod profile_handler;
pub mod registration_handler;
pub mod summary_handler;

/// User id of the authenticated caller.
pub(crate) fn caller_id(claims: &Claims) -> DbResult<Uuid> {
    claims.user_id().ok_or_else(|| {
        tracing::error!("Token subject {} is not a user id", claims.sub);
        HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Invalid user ID"))
    })
}
