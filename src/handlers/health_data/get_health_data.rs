use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::analyses::get_analysis_for_reading;
use crate::db::health_data::{count_health_data, delete_health_data, get_health_data, list_health_data};
use crate::db::helpers::{db_result, require_affected, require_record};
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::{ApiResponse, PageParams, Paginated};
use crate::models::health_data::{HealthDataQuery, HealthDataWithAnalysis};
use crate::ok_or_return;

#[tracing::instrument(name = "List health data", skip(pool, claims, query), fields(username = %claims.username))]
pub async fn list_user_health_data(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<HealthDataQuery>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error("`from` must not be after `to`"));
        }
    }

    let paging = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let items = ok_or_return!(db_result(
        list_health_data(&pool, user_id, query.from, query.to, paging.per_page(), paging.offset()).await
    ));
    let total = ok_or_return!(db_result(count_health_data(&pool, user_id, query.from, query.to).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Health data retrieved",
        Paginated {
            items,
            page: paging.page(),
            per_page: paging.per_page(),
            total,
        },
    ))
}

#[tracing::instrument(name = "Get health data", skip(pool, claims), fields(username = %claims.username))]
pub async fn get_user_health_data(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let id = id.into_inner();

    let reading = ok_or_return!(require_record(
        get_health_data(&pool, user_id, id).await,
        "Health data not found"
    ));
    let analysis = ok_or_return!(db_result(get_analysis_for_reading(&pool, user_id, id).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Health data retrieved",
        HealthDataWithAnalysis { reading, analysis },
    ))
}

#[tracing::instrument(name = "Delete health data", skip(pool, claims), fields(username = %claims.username))]
pub async fn delete_user_health_data(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    ok_or_return!(require_affected(
        delete_health_data(&pool, user_id, id.into_inner()).await,
        "Health data not found"
    ));

    HttpResponse::Ok().json(ApiResponse::<()>::success_message("Health data deleted"))
}
