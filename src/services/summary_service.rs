use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::analysis::{summarize, week_bounds};
use crate::db::analyses::risk_levels_for_readings;
use crate::db::health_data::{health_data_in_period, users_with_data_in_period};
use crate::db::notifications::notification_exists;
use crate::db::summaries::upsert_summary;
use crate::models::notification::NotificationType;
use crate::models::summary::HealthSummary;
use crate::services::notification_service::notify_user;

/// Build and store the summary of the week containing `week_of`.
///
/// Returns `Ok(None)` when the user has no readings in that week.
#[tracing::instrument(name = "Generate weekly summary", skip(pool), fields(user_id = %user_id))]
pub async fn generate_summary(
    pool: &PgPool,
    user_id: Uuid,
    week_of: NaiveDate,
) -> Result<Option<HealthSummary>, sqlx::Error> {
    let (start, end) = week_bounds(week_of);
    let readings = health_data_in_period(pool, user_id, start, end).await?;
    if readings.is_empty() {
        tracing::info!("No readings between {} and {}, no summary", start, end);
        return Ok(None);
    }

    let ids: Vec<Uuid> = readings.iter().map(|r| r.id).collect();
    let risk_levels = risk_levels_for_readings(pool, &ids).await?;
    let stats = summarize(&readings, &risk_levels);

    let summary = upsert_summary(pool, user_id, start, end, &stats).await?;
    tracing::info!("Stored summary {} over {} readings", summary.id, summary.reading_count);
    Ok(Some(summary))
}

/// Summarise the week for every user with data in it and notify each of them
/// once per summary, however often the week is rebuilt.
pub async fn generate_weekly_summaries(
    pool: &PgPool,
    week_of: NaiveDate,
) -> Result<Vec<HealthSummary>, sqlx::Error> {
    let (start, end) = week_bounds(week_of);
    let users = users_with_data_in_period(pool, start, end).await?;
    let mut summaries = Vec::with_capacity(users.len());

    for user_id in users {
        match generate_summary(pool, user_id, week_of).await {
            Ok(Some(summary)) => {
                // Re-running a week updates the summary row in place; its notification stays.
                match notification_exists(pool, user_id, NotificationType::WeeklySummary, summary.id).await {
                    Ok(true) => tracing::info!("User {} already notified about summary {}", user_id, summary.id),
                    Ok(false) => {
                        if let Err(e) = notify_user(
                            pool,
                            user_id,
                            NotificationType::WeeklySummary,
                            format!("Your weekly health summary ({})", start.format("%Y-%m-%d")),
                            summary_message(&summary),
                            Some(summary.id),
                        )
                        .await
                        {
                            tracing::error!("Failed to notify {} about summary {}: {}", user_id, summary.id, e);
                        }
                    }
                    Err(e) => tracing::error!("Failed to check notifications for {}: {}", user_id, e),
                }
                summaries.push(summary);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to summarise week for {}: {}", user_id, e),
        }
    }

    tracing::info!("Generated {} weekly summaries for week starting {}", summaries.len(), start);
    Ok(summaries)
}

/// Plain-text body used for the summary notification and email.
pub fn summary_message(summary: &HealthSummary) -> String {
    let mut lines = vec![format!(
        "Week {} to {}: {} readings.",
        summary.period_start.format("%Y-%m-%d"),
        (summary.period_end - chrono::Duration::days(1)).format("%Y-%m-%d"),
        summary.reading_count
    )];

    if let Some(hr) = summary.avg_heart_rate {
        lines.push(format!("Average heart rate: {:.0} bpm", hr));
    }
    if let Some(steps) = summary.avg_daily_steps {
        lines.push(format!("Average daily steps: {:.0}", steps));
    }
    if let Some(sleep) = summary.avg_sleep_hours {
        lines.push(format!("Average sleep: {:.1} h", sleep));
    }
    if let Some(calories) = summary.total_calories {
        lines.push(format!("Active calories: {:.0} kcal", calories));
    }
    if let Some(spo2) = summary.avg_spo2 {
        lines.push(format!("Average blood oxygen: {:.0} %", spo2));
    }
    if let Some(temp) = summary.avg_temperature {
        lines.push(format!("Average temperature: {:.1} °C", temp));
    }
    lines.push(format!(
        "Readings rated good/normal/bad: {}/{}/{}",
        summary.good_count, summary.normal_count, summary.bad_count
    ));
    if let Some(risk) = summary.risk_level {
        lines.push(format!("Overall rating: {}", risk));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::RiskLevel;
    use chrono::{TimeZone, Utc};

    #[test]
    fn summary_message_lists_present_metrics_only() {
        let summary = HealthSummary {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            period_start: Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            period_end: Utc.with_ymd_and_hms(2025, 3, 17, 0, 0, 0).unwrap(),
            reading_count: 4,
            avg_heart_rate: Some(71.4),
            min_heart_rate: Some(60.0),
            max_heart_rate: Some(82.0),
            total_steps: None,
            avg_daily_steps: None,
            avg_sleep_hours: Some(7.25),
            total_calories: None,
            avg_spo2: None,
            min_spo2: None,
            avg_temperature: None,
            good_count: 3,
            normal_count: 1,
            bad_count: 0,
            risk_level: Some(RiskLevel::Good),
            created_at: Utc::now(),
        };

        let message = summary_message(&summary);
        assert!(message.starts_with("Week 2025-03-10 to 2025-03-16: 4 readings."));
        assert!(message.contains("Average heart rate: 71 bpm"));
        assert!(message.contains("Average sleep: 7.2 h") || message.contains("Average sleep: 7.3 h"));
        assert!(!message.contains("steps"));
        assert!(message.contains("good/normal/bad: 3/1/0"));
        assert!(message.ends_with("Overall rating: good"));
    }
}
