use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::analysis::previous_week_start;
use crate::db::helpers::{database_error, db_result, require_record};
use crate::db::summaries::{count_summaries, latest_summary, list_summaries};
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::{ApiResponse, PageParams, Paginated};
use crate::models::summary::GenerateSummaryRequest;
use crate::ok_or_return;
use crate::services::summary_service::generate_summary;

pub async fn list_user_summaries(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    paging: web::Query<PageParams>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    let items = ok_or_return!(db_result(
        list_summaries(&pool, user_id, paging.per_page(), paging.offset()).await
    ));
    let total = ok_or_return!(db_result(count_summaries(&pool, user_id).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Summaries retrieved",
        Paginated {
            items,
            page: paging.page(),
            per_page: paging.per_page(),
            total,
        },
    ))
}

pub async fn get_latest_summary(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let summary = ok_or_return!(require_record(latest_summary(&pool, user_id).await, "No summary yet"));

    HttpResponse::Ok().json(ApiResponse::success("Summary retrieved", summary))
}

/// Summarise one week for the caller. Without `week_of` the previous week is used.
#[tracing::instrument(name = "Generate summary on demand", skip(pool, claims, body), fields(username = %claims.username))]
pub async fn generate_user_summary(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<GenerateSummaryRequest>>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let week_of = body
        .and_then(|b| b.into_inner().week_of)
        .unwrap_or_else(|| previous_week_start(Utc::now().date_naive()));

    match generate_summary(&pool, user_id, week_of).await {
        Ok(Some(summary)) => HttpResponse::Ok().json(ApiResponse::success("Summary generated", summary)),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("No readings in the requested week")),
        Err(e) => database_error(e),
    }
}
