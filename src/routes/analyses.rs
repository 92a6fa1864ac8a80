use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::analysis_handler::{
    get_analysis_advice, get_reading_analysis as reading_analysis, get_user_analysis,
    list_user_analyses, reanalyze_reading,
};
use crate::middleware::auth::Claims;
use crate::models::analysis::AnalysisQuery;
use crate::services::AdviceService;

#[get("/data/{id}/analysis")]
async fn get_reading_analysis(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    reading_analysis(pool, claims, id).await
}

#[post("/data/{id}/analyze")]
async fn analyze_reading(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    reanalyze_reading(pool, claims, id).await
}

#[get("/analyses")]
async fn list_analyses(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<AnalysisQuery>,
) -> HttpResponse {
    list_user_analyses(pool, claims, query).await
}

#[get("/analyses/{id}")]
async fn get_analysis(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    get_user_analysis(pool, claims, id).await
}

#[get("/analyses/{id}/advice")]
async fn get_advice(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    advice: web::Data<AdviceService>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    get_analysis_advice(pool, claims, advice, id).await
}
