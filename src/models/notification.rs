use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Emails are retried on every dispatch tick until this many attempts failed.
pub const MAX_EMAIL_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unread,
    Read,
    Archived,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Unread => "unread",
            NotificationStatus::Read => "read",
            NotificationStatus::Archived => "archived",
        }
    }
}

impl TryFrom<String> for NotificationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "unread" => Ok(NotificationStatus::Unread),
            "read" => Ok(NotificationStatus::Read),
            "archived" => Ok(NotificationStatus::Archived),
            other => Err(format!("Unknown notification status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    RiskAlert,
    WeeklySummary,
    ImportReport,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RiskAlert => "risk_alert",
            NotificationType::WeeklySummary => "weekly_summary",
            NotificationType::ImportReport => "import_report",
            NotificationType::System => "system",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for NotificationType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "risk_alert" => Ok(NotificationType::RiskAlert),
            "weekly_summary" => Ok(NotificationType::WeeklySummary),
            "import_report" => Ok(NotificationType::ImportReport),
            "system" => Ok(NotificationType::System),
            other => Err(format!("Unknown notification type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: NotificationStatus,
    pub related_id: Option<Uuid>,
    pub email_requested: bool,
    pub emailed_at: Option<DateTime<Utc>>,
    pub email_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub email_requested: bool,
}

/// A notification waiting to be emailed, joined with its recipient.
#[derive(Debug, Clone, FromRow)]
pub struct PendingEmail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub email_attempts: i32,
}

#[derive(Debug, Deserialize)]
pub struct NotificationQueryParams {
    pub status: Option<NotificationStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
    pub page: i64,
    pub per_page: i64,
}
