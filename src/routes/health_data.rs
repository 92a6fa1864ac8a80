use actix_multipart::form::MultipartForm;
use actix_web::{delete, get, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::health_data::create_health_data::create_health_data;
use crate::handlers::health_data::get_health_data::{
    delete_user_health_data, get_user_health_data, list_user_health_data,
};
use crate::handlers::health_data::upload_health_data::{upload_health_data, HealthDataUploadForm};
use crate::middleware::auth::Claims;
use crate::models::health_data::{CreateHealthDataRequest, HealthDataQuery};

#[post("/data")]
async fn create_health(
    body: web::Json<CreateHealthDataRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    create_health_data(body, pool, claims).await
}

#[post("/data/upload")]
async fn upload_health(
    form: MultipartForm<HealthDataUploadForm>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    upload_health_data(form, pool, claims).await
}

#[get("/data")]
async fn list_health(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<HealthDataQuery>,
) -> HttpResponse {
    list_user_health_data(pool, claims, query).await
}

#[get("/data/{id}")]
async fn get_health(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    get_user_health_data(pool, claims, id).await
}

#[delete("/data/{id}")]
async fn delete_health(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    delete_user_health_data(pool, claims, id).await
}
