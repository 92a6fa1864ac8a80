use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::health_data::{HealthData, NewHealthData};

pub async fn insert_health_data(
    pool: &PgPool,
    user_id: Uuid,
    data: &NewHealthData,
) -> Result<HealthData, sqlx::Error> {
    sqlx::query_as::<_, HealthData>(
        r#"
        INSERT INTO health_data (
            user_id, device_id, recorded_at, heart_rate, steps,
            sleep_hours, calories, spo2, temperature, source
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&data.device_id)
    .bind(data.recorded_at)
    .bind(data.vitals.heart_rate)
    .bind(data.vitals.steps)
    .bind(data.vitals.sleep_hours)
    .bind(data.vitals.calories)
    .bind(data.vitals.spo2)
    .bind(data.vitals.temperature)
    .bind(data.source.as_str())
    .fetch_one(pool)
    .await
}

pub async fn get_health_data(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<HealthData>, sqlx::Error> {
    sqlx::query_as::<_, HealthData>("SELECT * FROM health_data WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

fn push_range_filter<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    user_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) {
    builder.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(from) = from {
        builder.push(" AND recorded_at >= ").push_bind(from);
    }
    if let Some(to) = to {
        builder.push(" AND recorded_at < ").push_bind(to);
    }
}

/// Newest first.
pub async fn list_health_data(
    pool: &PgPool,
    user_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: i64,
    offset: i64,
) -> Result<Vec<HealthData>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM health_data");
    push_range_filter(&mut builder, user_id, from, to);
    builder
        .push(" ORDER BY recorded_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    builder.build_query_as::<HealthData>().fetch_all(pool).await
}

pub async fn count_health_data(
    pool: &PgPool,
    user_id: Uuid,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM health_data");
    push_range_filter(&mut builder, user_id, from, to);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn delete_health_data(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM health_data WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Readings of one user inside `[start, end)`, oldest first.
pub async fn health_data_in_period(
    pool: &PgPool,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<HealthData>, sqlx::Error> {
    sqlx::query_as::<_, HealthData>(
        r#"
        SELECT * FROM health_data
        WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at < $3
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Users with at least one reading inside `[start, end)`.
pub async fn users_with_data_in_period(
    pool: &PgPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT user_id FROM health_data WHERE recorded_at >= $1 AND recorded_at < $2",
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Readings that have not been analysed yet, oldest first.
pub async fn unanalyzed_health_data(pool: &PgPool, limit: i64) -> Result<Vec<HealthData>, sqlx::Error> {
    sqlx::query_as::<_, HealthData>(
        r#"
        SELECT hd.* FROM health_data hd
        LEFT JOIN health_analyses ha ON ha.health_data_id = hd.id
        WHERE ha.id IS NULL
        ORDER BY hd.created_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
