use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{
    NewNotification, Notification, NotificationStatus, NotificationType, PendingEmail, MAX_EMAIL_ATTEMPTS,
};

pub async fn create_notification(
    pool: &PgPool,
    notification: &NewNotification,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (user_id, notification_type, title, message, related_id, email_requested)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.notification_type.as_str())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.related_id)
    .bind(notification.email_requested)
    .fetch_one(pool)
    .await
}

pub async fn notification_exists(
    pool: &PgPool,
    user_id: Uuid,
    notification_type: NotificationType,
    related_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM notifications
            WHERE user_id = $1 AND notification_type = $2 AND related_id = $3
        )
        "#,
    )
    .bind(user_id)
    .bind(notification_type.as_str())
    .bind(related_id)
    .fetch_one(pool)
    .await
}

/// Without an explicit status, archived notifications are hidden.
pub async fn get_notifications(
    pool: &PgPool,
    user_id: Uuid,
    status: Option<NotificationStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1
          AND (($2::TEXT IS NULL AND status <> 'archived') OR status = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_notifications(
    pool: &PgPool,
    user_id: Uuid,
    status: Option<NotificationStatus>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE user_id = $1
          AND (($2::TEXT IS NULL AND status <> 'archived') OR status = $2)
        "#,
    )
    .bind(user_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await
}

pub async fn get_unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND status = 'unread'")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Move a notification to `status`. Returns false when it does not belong to the user.
pub async fn set_notification_status(
    pool: &PgPool,
    notification_id: Uuid,
    user_id: Uuid,
    status: NotificationStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET status = $3,
            read_at = CASE
                WHEN $3 = 'unread' THEN NULL
                ELSE COALESCE(read_at, NOW())
            END
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(notification_id)
    .bind(user_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_notifications_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET status = 'read', read_at = NOW() WHERE user_id = $1 AND status = 'unread'",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_notification(
    pool: &PgPool,
    notification_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn pending_emails(pool: &PgPool, limit: i64) -> Result<Vec<PendingEmail>, sqlx::Error> {
    sqlx::query_as::<_, PendingEmail>(
        r#"
        SELECT n.id, n.user_id, u.username, u.email, n.notification_type,
               n.title, n.message, n.email_attempts
        FROM notifications n
        JOIN users u ON u.id = n.user_id
        WHERE n.email_requested
          AND n.emailed_at IS NULL
          AND n.email_attempts < $1
        ORDER BY n.created_at ASC
        LIMIT $2
        "#,
    )
    .bind(MAX_EMAIL_ATTEMPTS)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn record_email_result(
    pool: &PgPool,
    notification_id: Uuid,
    delivered: bool,
) -> Result<(), sqlx::Error> {
    let query = if delivered {
        "UPDATE notifications SET emailed_at = NOW(), email_attempts = email_attempts + 1 WHERE id = $1"
    } else {
        "UPDATE notifications SET email_attempts = email_attempts + 1 WHERE id = $1"
    };
    sqlx::query(query).bind(notification_id).execute(pool).await?;
    Ok(())
}
