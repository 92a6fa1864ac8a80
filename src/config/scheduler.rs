use serde::Deserialize;

/// Cron expressions (seconds field first) for the background jobs.
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub import_cron: String,
    pub analysis_cron: String,
    pub summary_cron: String,
    pub email_cron: String,
}
