use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::analysis::RiskLevel;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HealthSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub reading_count: i64,
    pub avg_heart_rate: Option<f64>,
    pub min_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub total_steps: Option<i64>,
    pub avg_daily_steps: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub total_calories: Option<f64>,
    pub avg_spo2: Option<f64>,
    pub min_spo2: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub good_count: i64,
    pub normal_count: i64,
    pub bad_count: i64,
    /// Worst rating among the week's analyses, if any were made.
    pub risk_level: Option<RiskLevel>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateSummaryRequest {
    /// Any date inside the week to summarise. Defaults to last week.
    pub week_of: Option<NaiveDate>,
}
