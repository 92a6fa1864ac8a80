use sqlx::PgPool;

use crate::analysis::analyze;
use crate::db::analyses::upsert_analysis;
use crate::db::health_data::unanalyzed_health_data;
use crate::models::analysis::{HealthAnalysis, RiskLevel};
use crate::models::health_data::HealthData;
use crate::models::notification::NotificationType;
use crate::services::notification_service::notify_user;

/// Counters of one sweep over unanalysed readings.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct SweepReport {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run the rule table over a stored reading and persist the result.
///
/// Readings without any metric are skipped (`Ok(None)`). A Bad overall
/// risk raises a `risk_alert` notification; failing to store that
/// notification is logged and does not fail the analysis.
#[tracing::instrument(
    name = "Analyze health data",
    skip(pool, reading),
    fields(health_data_id = %reading.id, user_id = %reading.user_id)
)]
pub async fn analyze_and_store(
    pool: &PgPool,
    reading: &HealthData,
) -> Result<Option<HealthAnalysis>, sqlx::Error> {
    let Some(outcome) = analyze(&reading.vitals()) else {
        tracing::warn!("Reading {} has no metrics, skipping analysis", reading.id);
        return Ok(None);
    };

    let analysis = upsert_analysis(pool, reading.user_id, reading.id, &outcome).await?;
    tracing::info!("Stored analysis {} with risk level {}", analysis.id, analysis.risk_level);

    if analysis.risk_level == RiskLevel::Bad {
        let title = "Health alert: reading outside safe range".to_string();
        let message = format!(
            "Your reading from {} needs attention.\n\n{}\n\nSuggestion:\n{}",
            reading.recorded_at.format("%Y-%m-%d %H:%M UTC"),
            analysis.interpretation,
            analysis.suggestion
        );
        if let Err(e) = notify_user(
            pool,
            reading.user_id,
            NotificationType::RiskAlert,
            title,
            message,
            Some(analysis.id),
        )
        .await
        {
            tracing::error!("Failed to create risk alert for analysis {}: {}", analysis.id, e);
        }
    }

    Ok(Some(analysis))
}

/// Analyse up to `limit` readings that have no analysis yet.
pub async fn analyze_pending(pool: &PgPool, limit: i64) -> Result<SweepReport, sqlx::Error> {
    let pending = unanalyzed_health_data(pool, limit).await?;
    let mut report = SweepReport::default();

    for reading in &pending {
        match analyze_and_store(pool, reading).await {
            Ok(Some(_)) => report.analyzed += 1,
            Ok(None) => report.skipped += 1,
            Err(e) => {
                tracing::error!("Failed to analyze reading {}: {}", reading.id, e);
                report.failed += 1;
            }
        }
    }

    if !pending.is_empty() {
        tracing::info!(
            "Analysis sweep: {} analyzed, {} skipped, {} failed",
            report.analyzed,
            report.skipped,
            report.failed
        );
    }
    Ok(report)
}
