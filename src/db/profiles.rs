use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::{ProfileResponse, UpdateProfileRequest};

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileResponse>, sqlx::Error> {
    sqlx::query_as::<_, ProfileResponse>(
        r#"
        SELECT u.id AS user_id, u.username, u.email,
               p.full_name, p.date_of_birth, p.gender, p.height_cm, p.weight_kg,
               p.email_notifications, p.updated_at
        FROM users u
        JOIN user_profiles p ON p.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Partial update; absent fields keep their stored value.
pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &UpdateProfileRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_profiles (user_id, full_name, date_of_birth, gender, height_cm, weight_kg, email_notifications, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, TRUE), NOW())
        ON CONFLICT (user_id)
        DO UPDATE SET
            full_name = COALESCE($2, user_profiles.full_name),
            date_of_birth = COALESCE($3, user_profiles.date_of_birth),
            gender = COALESCE($4, user_profiles.gender),
            height_cm = COALESCE($5, user_profiles.height_cm),
            weight_kg = COALESCE($6, user_profiles.weight_kg),
            email_notifications = COALESCE($7, user_profiles.email_notifications),
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(update.full_name.as_deref())
    .bind(update.date_of_birth)
    .bind(update.gender.as_deref())
    .bind(update.height_cm)
    .bind(update.weight_kg)
    .bind(update.email_notifications)
    .execute(pool)
    .await?;
    Ok(())
}
