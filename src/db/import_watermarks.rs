use sqlx::PgPool;

/// Sheet row 1 holds the header, so an unseen source starts after it.
pub const HEADER_ROW: i64 = 1;

pub async fn get_watermark(pool: &PgPool, source_id: &str) -> Result<i64, sqlx::Error> {
    let last_row: Option<i64> =
        sqlx::query_scalar("SELECT last_row FROM import_watermarks WHERE source_id = $1")
            .bind(source_id)
            .fetch_optional(pool)
            .await?;
    Ok(last_row.unwrap_or(HEADER_ROW))
}

pub async fn set_watermark(pool: &PgPool, source_id: &str, last_row: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO import_watermarks (source_id, last_row, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (source_id)
        DO UPDATE SET last_row = GREATEST(import_watermarks.last_row, EXCLUDED.last_row), updated_at = NOW()
        "#,
    )
    .bind(source_id)
    .bind(last_row)
    .execute(pool)
    .await?;
    Ok(())
}
