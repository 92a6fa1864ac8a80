use actix_web::HttpResponse;
use sqlx::PgPool;

use crate::models::common::ApiResponse;

/// Liveness plus a database round trip.
pub async fn backend_health_check(pool: &PgPool) -> HttpResponse {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HttpResponse::Ok().json(ApiResponse::success(
            "Backend is healthy",
            serde_json::json!({ "status": "ok", "database": "ok" }),
        )),
        Err(e) => {
            tracing::error!("Health check could not reach the database: {}", e);
            HttpResponse::ServiceUnavailable().json(ApiResponse::<()>::error("Database unavailable"))
        }
    }
}
