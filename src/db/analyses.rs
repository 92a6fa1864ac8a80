use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::AnalysisOutcome;
use crate::models::analysis::{HealthAnalysis, RiskLevel};

/// Insert or replace the analysis of one reading.
pub async fn upsert_analysis(
    pool: &PgPool,
    user_id: Uuid,
    health_data_id: Uuid,
    outcome: &AnalysisOutcome,
) -> Result<HealthAnalysis, sqlx::Error> {
    sqlx::query_as::<_, HealthAnalysis>(
        r#"
        INSERT INTO health_analyses (user_id, health_data_id, risk_level, interpretation, suggestion, findings)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (health_data_id)
        DO UPDATE SET
            risk_level = EXCLUDED.risk_level,
            interpretation = EXCLUDED.interpretation,
            suggestion = EXCLUDED.suggestion,
            findings = EXCLUDED.findings,
            created_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(health_data_id)
    .bind(outcome.risk_level.as_str())
    .bind(&outcome.interpretation)
    .bind(&outcome.suggestion)
    .bind(Json(&outcome.findings))
    .fetch_one(pool)
    .await
}

pub async fn get_analysis(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<HealthAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, HealthAnalysis>("SELECT * FROM health_analyses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_analysis_for_reading(
    pool: &PgPool,
    user_id: Uuid,
    health_data_id: Uuid,
) -> Result<Option<HealthAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, HealthAnalysis>(
        "SELECT * FROM health_analyses WHERE health_data_id = $1 AND user_id = $2",
    )
    .bind(health_data_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_analyses(
    pool: &PgPool,
    user_id: Uuid,
    risk_level: Option<RiskLevel>,
    limit: i64,
    offset: i64,
) -> Result<Vec<HealthAnalysis>, sqlx::Error> {
    sqlx::query_as::<_, HealthAnalysis>(
        r#"
        SELECT * FROM health_analyses
        WHERE user_id = $1 AND ($2::TEXT IS NULL OR risk_level = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(risk_level.map(|r| r.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_analyses(
    pool: &PgPool,
    user_id: Uuid,
    risk_level: Option<RiskLevel>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM health_analyses WHERE user_id = $1 AND ($2::TEXT IS NULL OR risk_level = $2)",
    )
    .bind(user_id)
    .bind(risk_level.map(|r| r.as_str()))
    .fetch_one(pool)
    .await
}

/// Risk levels of the analyses of the given readings.
pub async fn risk_levels_for_readings(
    pool: &PgPool,
    health_data_ids: &[Uuid],
) -> Result<Vec<RiskLevel>, sqlx::Error> {
    let levels: Vec<String> = sqlx::query_scalar(
        "SELECT risk_level FROM health_analyses WHERE health_data_id = ANY($1)",
    )
    .bind(health_data_ids)
    .fetch_all(pool)
    .await?;

    Ok(levels.iter().filter_map(|l| RiskLevel::from_str(l)).collect())
}
