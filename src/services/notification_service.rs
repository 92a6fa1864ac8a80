use sqlx::PgPool;
use uuid::Uuid;

use crate::db::notifications::create_notification;
use crate::db::users::wants_email;
use crate::models::notification::{NewNotification, Notification, NotificationType};

/// Store a notification for `user_id`, requesting an email when the user opted in.
#[tracing::instrument(
    name = "Create notification",
    skip(pool, title, message),
    fields(user_id = %user_id, notification_type = %notification_type)
)]
pub async fn notify_user(
    pool: &PgPool,
    user_id: Uuid,
    notification_type: NotificationType,
    title: String,
    message: String,
    related_id: Option<Uuid>,
) -> Result<Notification, sqlx::Error> {
    let email_requested = wants_email(pool, user_id).await.unwrap_or_else(|e| {
        tracing::warn!("Could not read email preference for {}: {}", user_id, e);
        false
    });

    let notification = create_notification(
        pool,
        &NewNotification {
            user_id,
            notification_type,
            title,
            message,
            related_id,
            email_requested,
        },
    )
    .await?;

    tracing::info!(
        "Created {} notification {} (email requested: {})",
        notification_type,
        notification.id,
        email_requested
    );
    Ok(notification)
}
