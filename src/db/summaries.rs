use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::SummaryStats;
use crate::models::summary::HealthSummary;

pub async fn upsert_summary(
    pool: &PgPool,
    user_id: Uuid,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    stats: &SummaryStats,
) -> Result<HealthSummary, sqlx::Error> {
    sqlx::query_as::<_, HealthSummary>(
        r#"
        INSERT INTO health_summaries (
            user_id, period_start, period_end, reading_count,
            avg_heart_rate, min_heart_rate, max_heart_rate,
            total_steps, avg_daily_steps, avg_sleep_hours, total_calories,
            avg_spo2, min_spo2, avg_temperature,
            good_count, normal_count, bad_count, risk_level
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        ON CONFLICT (user_id, period_start)
        DO UPDATE SET
            period_end = EXCLUDED.period_end,
            reading_count = EXCLUDED.reading_count,
            avg_heart_rate = EXCLUDED.avg_heart_rate,
            min_heart_rate = EXCLUDED.min_heart_rate,
            max_heart_rate = EXCLUDED.max_heart_rate,
            total_steps = EXCLUDED.total_steps,
            avg_daily_steps = EXCLUDED.avg_daily_steps,
            avg_sleep_hours = EXCLUDED.avg_sleep_hours,
            total_calories = EXCLUDED.total_calories,
            avg_spo2 = EXCLUDED.avg_spo2,
            min_spo2 = EXCLUDED.min_spo2,
            avg_temperature = EXCLUDED.avg_temperature,
            good_count = EXCLUDED.good_count,
            normal_count = EXCLUDED.normal_count,
            bad_count = EXCLUDED.bad_count,
            risk_level = EXCLUDED.risk_level,
            created_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(period_start)
    .bind(period_end)
    .bind(stats.reading_count)
    .bind(stats.avg_heart_rate)
    .bind(stats.min_heart_rate)
    .bind(stats.max_heart_rate)
    .bind(stats.total_steps)
    .bind(stats.avg_daily_steps)
    .bind(stats.avg_sleep_hours)
    .bind(stats.total_calories)
    .bind(stats.avg_spo2)
    .bind(stats.min_spo2)
    .bind(stats.avg_temperature)
    .bind(stats.good_count)
    .bind(stats.normal_count)
    .bind(stats.bad_count)
    .bind(stats.risk_level.map(|r| r.as_str()))
    .fetch_one(pool)
    .await
}

pub async fn list_summaries(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<HealthSummary>, sqlx::Error> {
    sqlx::query_as::<_, HealthSummary>(
        r#"
        SELECT * FROM health_summaries
        WHERE user_id = $1
        ORDER BY period_start DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_summaries(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM health_summaries WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn latest_summary(pool: &PgPool, user_id: Uuid) -> Result<Option<HealthSummary>, sqlx::Error> {
    sqlx::query_as::<_, HealthSummary>(
        "SELECT * FROM health_summaries WHERE user_id = $1 ORDER BY period_start DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
