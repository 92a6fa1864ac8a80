use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::helpers::{db_result, require_affected};
use crate::db::notifications::{
    count_notifications, delete_notification, get_notifications, get_unread_count,
    mark_all_notifications_read, set_notification_status,
};
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::{ApiResponse, PageParams};
use crate::models::notification::{NotificationListResponse, NotificationQueryParams, NotificationStatus};
use crate::ok_or_return;

pub async fn get_user_notifications(
    pool: web::Data<PgPool>,
    query: web::Query<NotificationQueryParams>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let paging = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let notifications = ok_or_return!(db_result(
        get_notifications(&pool, user_id, query.status, paging.per_page(), paging.offset()).await
    ));
    let total = ok_or_return!(db_result(count_notifications(&pool, user_id, query.status).await));
    let unread_count = ok_or_return!(db_result(get_unread_count(&pool, user_id).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Notifications retrieved",
        NotificationListResponse {
            notifications,
            total,
            unread_count,
            page: paging.page(),
            per_page: paging.per_page(),
        },
    ))
}

pub async fn get_unread_notification_count(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let count = ok_or_return!(db_result(get_unread_count(&pool, user_id).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "Unread count retrieved",
        serde_json::json!({ "unread_count": count }),
    ))
}

pub async fn mark_all_as_read(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));
    let count = ok_or_return!(db_result(mark_all_notifications_read(&pool, user_id).await));

    HttpResponse::Ok().json(ApiResponse::success(
        "All notifications marked as read",
        serde_json::json!({ "marked_read": count }),
    ))
}

/// Shared body of the read / unread / archive transitions.
async fn transition(
    pool: &PgPool,
    claims: &Claims,
    notification_id: Uuid,
    status: NotificationStatus,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(claims));

    ok_or_return!(require_affected(
        set_notification_status(pool, notification_id, user_id, status).await,
        "Notification not found"
    ));

    tracing::info!("Notification {} moved to {}", notification_id, status.as_str());
    HttpResponse::Ok().json(ApiResponse::<()>::success_message(format!(
        "Notification marked as {}",
        status.as_str()
    )))
}

pub async fn mark_notification_as_read(
    pool: web::Data<PgPool>,
    notification_id: web::Path<Uuid>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    transition(&pool, &claims, notification_id.into_inner(), NotificationStatus::Read).await
}

pub async fn mark_notification_as_unread(
    pool: web::Data<PgPool>,
    notification_id: web::Path<Uuid>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    transition(&pool, &claims, notification_id.into_inner(), NotificationStatus::Unread).await
}

pub async fn archive_notification(
    pool: web::Data<PgPool>,
    notification_id: web::Path<Uuid>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    transition(&pool, &claims, notification_id.into_inner(), NotificationStatus::Archived).await
}

pub async fn delete_user_notification(
    pool: web::Data<PgPool>,
    notification_id: web::Path<Uuid>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    ok_or_return!(require_affected(
        delete_notification(&pool, notification_id.into_inner(), user_id).await,
        "Notification not found"
    ));

    HttpResponse::Ok().json(ApiResponse::<()>::success_message("Notification deleted"))
}
