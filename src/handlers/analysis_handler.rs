use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::analyses::{count_analyses, get_analysis, get_analysis_for_reading, list_analyses};
use crate::db::health_data::get_health_data;
use crate::db::helpers::{database_error, db_result, require_record};
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::analysis::{AdviceResponse, AnalysisQuery};
use crate::models::common::{ApiResponse, PageParams, Paginated};
use crate::ok_or_return;
use crate::services::advice_service::AdviceService;
use crate::services::analysis_service::analyze_and_store;

#[tracing::instrument(name = "List analyses", skip(pool, claims, query), fields(username = %claims.username))]
pub async fn list_user_analyses(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    query: web::Query<AnalysisQuery>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let paging = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let items = ok_or_return!(db_result(
        list_analyses(&pool, user_id, query.risk_level, paging.per_page(), paging.offset()).await
    ));
    let total = ok_or_return!(db_result(count_analyses(&pool, user_id, query.risk_level).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Analyses retrieved",
        Paginated {
            items,
            page: paging.page(),
            per_page: paging.per_page(),
            total,
        },
    ))
}

pub async fn get_user_analysis(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let analysis = ok_or_return!(require_record(
        get_analysis(&pool, user_id, id.into_inner()).await,
        "Analysis not found"
    ));

    HttpResponse::Ok().json(ApiResponse::success("Analysis retrieved", analysis))
}

pub async fn get_reading_analysis(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    health_data_id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let analysis = ok_or_return!(require_record(
        get_analysis_for_reading(&pool, user_id, health_data_id.into_inner()).await,
        "Analysis not found"
    ));

    HttpResponse::Ok().json(ApiResponse::success("Analysis retrieved", analysis))
}

/// Run the rule table again over a stored reading, replacing its analysis.
#[tracing::instrument(name = "Reanalyze health data", skip(pool, claims), fields(username = %claims.username))]
pub async fn reanalyze_reading(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    health_data_id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let reading = ok_or_return!(require_record(
        get_health_data(&pool, user_id, health_data_id.into_inner()).await,
        "Health data not found"
    ));

    match analyze_and_store(&pool, &reading).await {
        Ok(Some(analysis)) => HttpResponse::Ok().json(ApiResponse::success("Reading analyzed", analysis)),
        Ok(None) => HttpResponse::UnprocessableEntity()
            .json(ApiResponse::<()>::error("Reading carries no metrics to analyze")),
        Err(e) => database_error(e),
    }
}

#[tracing::instrument(name = "Get analysis advice", skip(pool, claims, advice), fields(username = %claims.username))]
pub async fn get_analysis_advice(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
    advice: web::Data<AdviceService>,
    id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let analysis = ok_or_return!(require_record(
        get_analysis(&pool, user_id, id.into_inner()).await,
        "Analysis not found"
    ));

    let (text, source) = advice.advise(&analysis).await;
    HttpResponse::Ok().json(ApiResponse::success(
        "Advice generated",
        AdviceResponse {
            analysis_id: analysis.id,
            advice: text,
            source,
        },
    ))
}
