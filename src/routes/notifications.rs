use actix_web::{delete, get, patch, post, web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::notification_handler::{
    archive_notification, delete_user_notification, get_unread_notification_count,
    get_user_notifications, mark_all_as_read, mark_notification_as_read, mark_notification_as_unread,
};
use crate::middleware::auth::Claims;
use crate::models::notification::NotificationQueryParams;

#[get("")]
async fn list_notifications(
    pool: web::Data<PgPool>,
    query: web::Query<NotificationQueryParams>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    get_user_notifications(pool, query, claims).await
}

#[get("/unread_count")]
async fn unread_count(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    get_unread_notification_count(pool, claims).await
}

#[post("/read_all")]
async fn read_all(pool: web::Data<PgPool>, claims: web::ReqData<Claims>) -> HttpResponse {
    mark_all_as_read(pool, claims).await
}

#[patch("/{id}/read")]
async fn mark_read(pool: web::Data<PgPool>, id: web::Path<Uuid>, claims: web::ReqData<Claims>) -> HttpResponse {
    mark_notification_as_read(pool, id, claims).await
}

#[patch("/{id}/unread")]
async fn mark_unread(pool: web::Data<PgPool>, id: web::Path<Uuid>, claims: web::ReqData<Claims>) -> HttpResponse {
    mark_notification_as_unread(pool, id, claims).await
}

#[patch("/{id}/archive")]
async fn archive(pool: web::Data<PgPool>, id: web::Path<Uuid>, claims: web::ReqData<Claims>) -> HttpResponse {
    archive_notification(pool, id, claims).await
}

#[delete("/{id}")]
async fn delete_one(pool: web::Data<PgPool>, id: web::Path<Uuid>, claims: web::ReqData<Claims>) -> HttpResponse {
    delete_user_notification(pool, id, claims).await
}
