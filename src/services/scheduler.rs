use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use crate::analysis::previous_week_start;
use crate::config::scheduler::SchedulerSettings;
use crate::services::analysis_service::analyze_pending;
use crate::services::email_service::{dispatch_pending, EmailService};
use crate::services::import_service::ImportTarget;
use crate::services::summary_service::generate_weekly_summaries;

pub const IMPORT_JOB: &str = "import";
pub const ANALYSIS_JOB: &str = "analysis";
pub const SUMMARY_JOB: &str = "summary";
pub const EMAIL_JOB: &str = "email";

const ANALYSIS_BATCH: i64 = 200;
const EMAIL_BATCH: i64 = 50;

pub struct SchedulerService {
    scheduler: Arc<Mutex<JobScheduler>>,
    pool: PgPool,
    settings: SchedulerSettings,
    email: EmailService,
    import: Option<ImportTarget>,
    // job name -> scheduler job id
    active_jobs: Arc<Mutex<HashMap<&'static str, Uuid>>>,
}

impl SchedulerService {
    pub async fn new(
        pool: PgPool,
        settings: SchedulerSettings,
        email: EmailService,
        import: Option<ImportTarget>,
    ) -> Result<Self, Box<dyn Error>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            pool,
            settings,
            email,
            import,
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Register the configured jobs and start ticking. A disabled scheduler
    /// registers nothing.
    pub async fn start(&self) -> Result<(), Box<dyn Error>> {
        if !self.settings.enabled {
            tracing::info!("Scheduler disabled, no background jobs registered");
            return Ok(());
        }

        if let Some(import) = &self.import {
            self.schedule_import(import.clone()).await?;
        } else {
            tracing::info!("Spreadsheet import not configured, import job skipped");
        }
        self.schedule_analysis_sweep().await?;
        self.schedule_weekly_summary().await?;
        self.schedule_email_dispatch().await?;

        let scheduler = self.scheduler.lock().await;
        scheduler.start().await?;

        tracing::info!("Scheduler started with jobs: {:?}", self.registered_jobs().await);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), Box<dyn Error>> {
        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;
        self.active_jobs.lock().await.clear();

        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Names of the jobs currently registered, sorted.
    pub async fn registered_jobs(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.active_jobs.lock().await.keys().copied().collect();
        names.sort_unstable();
        names
    }

    async fn register(&self, name: &'static str, job: Job) -> Result<(), JobSchedulerError> {
        let job_id = job.guid();
        let scheduler = self.scheduler.lock().await;
        scheduler.add(job).await?;
        self.active_jobs.lock().await.insert(name, job_id);
        Ok(())
    }

    async fn schedule_import(&self, import: ImportTarget) -> Result<(), JobSchedulerError> {
        let pool = self.pool.clone();

        let job = Job::new_async(self.settings.import_cron.as_str(), move |_uuid, _l| {
            let pool = pool.clone();
            let import = import.clone();

            Box::pin(async move {
                tracing::info!("Running scheduled spreadsheet import");
                match import.run(&pool).await {
                    Ok(report) => tracing::info!(
                        "Scheduled import finished: {} imported, {} skipped",
                        report.imported,
                        report.skipped
                    ),
                    Err(e) => tracing::error!("Scheduled import failed: {}", e),
                }
            })
        })?;

        self.register(IMPORT_JOB, job).await?;
        tracing::info!("Scheduled spreadsheet import ({})", self.settings.import_cron);
        Ok(())
    }

    async fn schedule_analysis_sweep(&self) -> Result<(), JobSchedulerError> {
        let pool = self.pool.clone();

        let job = Job::new_async(self.settings.analysis_cron.as_str(), move |_uuid, _l| {
            let pool = pool.clone();

            Box::pin(async move {
                if let Err(e) = analyze_pending(&pool, ANALYSIS_BATCH).await {
                    tracing::error!("Scheduled analysis sweep failed: {}", e);
                }
            })
        })?;

        self.register(ANALYSIS_JOB, job).await?;
        tracing::info!("Scheduled analysis sweep ({})", self.settings.analysis_cron);
        Ok(())
    }

    async fn schedule_weekly_summary(&self) -> Result<(), JobSchedulerError> {
        let pool = self.pool.clone();

        let job = Job::new_async(self.settings.summary_cron.as_str(), move |_uuid, _l| {
            let pool = pool.clone();

            Box::pin(async move {
                let week_of = previous_week_start(Utc::now().date_naive());
                tracing::info!("Running scheduled weekly summaries for week of {}", week_of);
                if let Err(e) = generate_weekly_summaries(&pool, week_of).await {
                    tracing::error!("Scheduled weekly summaries failed: {}", e);
                }
            })
        })?;

        self.register(SUMMARY_JOB, job).await?;
        tracing::info!("Scheduled weekly summaries ({})", self.settings.summary_cron);
        Ok(())
    }

    async fn schedule_email_dispatch(&self) -> Result<(), JobSchedulerError> {
        let pool = self.pool.clone();
        let email = self.email.clone();

        let job = Job::new_async(self.settings.email_cron.as_str(), move |_uuid, _l| {
            let pool = pool.clone();
            let email = email.clone();

            Box::pin(async move {
                if let Err(e) = dispatch_pending(&pool, &email, EMAIL_BATCH).await {
                    tracing::error!("Scheduled email dispatch failed: {}", e);
                }
            })
        })?;

        self.register(EMAIL_JOB, job).await?;
        tracing::info!("Scheduled email dispatch ({})", self.settings.email_cron);
        Ok(())
    }
}
