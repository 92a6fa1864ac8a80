use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::health_data::insert_health_data;
use crate::db::helpers::db_result;
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::health_data::{CreateHealthDataRequest, HealthDataWithAnalysis};
use crate::ok_or_return;
use crate::services::analysis_service::analyze_and_store;

/// Store one reading and analyse it right away.
///
/// A failed analysis is logged and the reading is returned without one; the
/// background sweep picks it up later.
#[tracing::instrument(
    name = "Create health data",
    skip(body, pool, claims),
    fields(username = %claims.username)
)]
pub async fn create_health_data(
    body: web::Json<CreateHealthDataRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    let new_reading = match body.into_inner().into_new() {
        Ok(reading) => reading,
        Err(message) => {
            tracing::info!("Rejected reading: {}", message);
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error(message));
        }
    };

    let reading = ok_or_return!(db_result(insert_health_data(&pool, user_id, &new_reading).await));
    tracing::info!("Stored health data {}", reading.id);

    let analysis = match analyze_and_store(&pool, &reading).await {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::error!("Analysis of {} failed: {}", reading.id, e);
            None
        }
    };

    HttpResponse::Created().json(ApiResponse::success(
        "Health data stored",
        HealthDataWithAnalysis { reading, analysis },
    ))
}
