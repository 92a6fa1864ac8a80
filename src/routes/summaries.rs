use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::summary_handler::{generate_user_summary, get_latest_summary, list_user_summaries};
use crate::middleware::auth::Claims;
use crate::models::common::PageParams;
use crate::models::summary::GenerateSummaryRequest;

#[get("/summaries")]
async fn list_summaries(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    paging: web::Query<PageParams>,
) -> HttpResponse {
    list_user_summaries(pool, claims, paging).await
}

#[get("/summaries/latest")]
async fn latest_summary(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    get_latest_summary(pool, claims).await
}

#[post("/summaries/generate")]
async fn generate_summary(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    body: Option<web::Json<GenerateSummaryRequest>>,
) -> HttpResponse {
    generate_user_summary(pool, claims, body).await
}
