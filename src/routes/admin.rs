use actix_web::{post, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::admin_handler::{dispatch_emails_now, run_import_now, run_summaries_now};
use crate::middleware::auth::Claims;
use crate::models::summary::GenerateSummaryRequest;
use crate::services::import_service::ImportTarget;
use crate::services::EmailService;

#[post("/import/run")]
async fn run_import(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    import: web::Data<Option<ImportTarget>>,
) -> HttpResponse {
    run_import_now(pool, claims, import).await
}

#[post("/summaries/run")]
async fn run_summaries(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<GenerateSummaryRequest>>,
) -> HttpResponse {
    run_summaries_now(pool, claims, body).await
}

#[post("/emails/dispatch")]
async fn dispatch_emails(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    email: web::Data<EmailService>,
) -> HttpResponse {
    dispatch_emails_now(pool, claims, email).await
}
