use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::analysis::previous_week_start;
use crate::db::helpers::database_error;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::summary::GenerateSummaryRequest;
use crate::services::email_service::{dispatch_pending, EmailService};
use crate::services::import_service::ImportTarget;
use crate::services::sheets_client::ImportError;
use crate::services::summary_service::generate_weekly_summaries;

const MANUAL_DISPATCH_LIMIT: i64 = 200;

/// Run the spreadsheet import now instead of waiting for the schedule.
#[tracing::instrument(name = "Admin import run", skip(pool, claims, import), fields(admin = %claims.username))]
pub async fn run_import_now(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    import: web::Data<Option<ImportTarget>>,
) -> HttpResponse {
    let Some(import) = import.get_ref() else {
        return HttpResponse::Conflict().json(ApiResponse::<()>::error("Spreadsheet import is not configured"));
    };

    match import.run(&pool).await {
        Ok(report) => HttpResponse::Ok().json(ApiResponse::success("Import finished", report)),
        Err(ImportError::Database(e)) => database_error(e),
        Err(e) => {
            tracing::error!("Manual import failed: {}", e);
            HttpResponse::BadGateway().json(ApiResponse::<()>::error(format!("Import failed: {}", e)))
        }
    }
}

/// Build weekly summaries for all users, by default for last week.
#[tracing::instrument(name = "Admin summaries run", skip(pool, claims, body), fields(admin = %claims.username))]
pub async fn run_summaries_now(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<GenerateSummaryRequest>>,
) -> HttpResponse {
    let week_of = body
        .and_then(|b| b.into_inner().week_of)
        .unwrap_or_else(|| previous_week_start(Utc::now().date_naive()));

    match generate_weekly_summaries(&pool, week_of).await {
        Ok(summaries) => HttpResponse::Ok().json(ApiResponse::success(
            "Weekly summaries generated",
            serde_json::json!({ "week_of": week_of, "generated": summaries.len() }),
        )),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(name = "Admin email dispatch", skip(pool, claims, email), fields(admin = %claims.username))]
pub async fn dispatch_emails_now(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    email: web::Data<EmailService>,
) -> HttpResponse {
    if !email.is_enabled() {
        return HttpResponse::Conflict().json(ApiResponse::<()>::error("Email delivery is disabled"));
    }

    match dispatch_pending(&pool, &email, MANUAL_DISPATCH_LIMIT).await {
        Ok(report) => HttpResponse::Ok().json(ApiResponse::success("Pending emails dispatched", report)),
        Err(e) => database_error(e),
    }
}
