use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::health_data::insert_health_data;
use crate::db::import_watermarks::{get_watermark, set_watermark};
use crate::db::users::find_by_email;
use crate::models::health_data::{DataSource, NewHealthData};
use crate::models::import::ImportReport;
use crate::models::notification::NotificationType;
use crate::services::analysis_service::analyze_and_store;
use crate::services::notification_service::notify_user;
use crate::services::sheets_client::{ImportError, SheetSource};
use crate::utils::reading_parser::RawReading;

const SHEET_DEVICE: &str = "spreadsheet";

/// The configured spreadsheet, shared by the scheduled job and the admin
/// endpoint. Runs are serialised so two passes never read the same rows.
#[derive(Clone)]
pub struct ImportTarget {
    source: Arc<dyn SheetSource>,
    page_size: u32,
    lock: Arc<Mutex<()>>,
}

impl ImportTarget {
    pub fn new(source: Arc<dyn SheetSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run(&self, pool: &PgPool) -> Result<ImportReport, ImportError> {
        let _guard = self.lock.lock().await;
        run_import(pool, self.source.as_ref(), self.page_size).await
    }
}

/// A sheet row split into the owner's email and the reading it carries.
///
/// Columns: email, recorded_at, heart_rate, steps, sleep_hours, calories,
/// spo2, temperature, device_id. Missing trailing cells are blank.
pub fn parse_sheet_row(row: &[String]) -> Result<(String, NewHealthData), String> {
    let cell = |index: usize| row.get(index).map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

    let email = cell(0).ok_or_else(|| "email is required".to_string())?;
    let raw = RawReading {
        recorded_at: cell(1).unwrap_or_default(),
        heart_rate: cell(2),
        steps: cell(3),
        sleep_hours: cell(4),
        calories: cell(5),
        spo2: cell(6),
        temperature: cell(7),
        device_id: cell(8),
    };
    let reading = raw.into_new(DataSource::Import, SHEET_DEVICE)?;
    Ok((email.to_lowercase(), reading))
}

/// Import every sheet row past the stored watermark.
///
/// Rows are read in pages of `page_size`. Rows that cannot be parsed or that
/// belong to no registered user are logged and skipped; the watermark still
/// moves past them so they are not read again. A database failure stops the
/// run with the watermark left after the last stored row.
#[tracing::instrument(name = "Import spreadsheet readings", skip(pool, source))]
pub async fn run_import(
    pool: &PgPool,
    source: &dyn SheetSource,
    page_size: u32,
) -> Result<ImportReport, ImportError> {
    let source_id = source.source_id();
    let page_size = page_size.max(1);
    let mut watermark = get_watermark(pool, &source_id).await?;
    let mut report = ImportReport {
        watermark,
        ..Default::default()
    };
    let mut imported_per_user: HashMap<Uuid, usize> = HashMap::new();

    loop {
        let start_row = watermark + 1;
        let rows = source.fetch_rows(start_row, page_size).await?;
        let fetched = rows.len();

        for (offset, row) in rows.iter().enumerate() {
            let row_number = start_row + offset as i64;
            report.rows_read += 1;

            match import_row(pool, row_number, row).await {
                Ok(Some(user_id)) => {
                    report.imported += 1;
                    *imported_per_user.entry(user_id).or_default() += 1;
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    tracing::error!("Import stopped at row {}: {}", row_number, e);
                    set_watermark(pool, &source_id, watermark).await?;
                    return Err(e.into());
                }
            }
            watermark = row_number;
        }

        set_watermark(pool, &source_id, watermark).await?;
        if fetched < page_size as usize {
            break;
        }
    }

    report.watermark = watermark;
    notify_imported(pool, &imported_per_user).await;

    tracing::info!(
        "Import of {}: {} rows read, {} imported, {} skipped, watermark at row {}",
        source_id,
        report.rows_read,
        report.imported,
        report.skipped,
        report.watermark
    );
    Ok(report)
}

/// Store one row. `Ok(None)` means the row was skipped.
async fn import_row(pool: &PgPool, row_number: i64, row: &[String]) -> Result<Option<Uuid>, sqlx::Error> {
    if row.iter().all(|c| c.trim().is_empty()) {
        return Ok(None);
    }

    let (email, new_reading) = match parse_sheet_row(row) {
        Ok(parsed) => parsed,
        Err(reason) => {
            tracing::warn!("Skipping sheet row {}: {}", row_number, reason);
            return Ok(None);
        }
    };

    let Some(user) = find_by_email(pool, &email).await? else {
        tracing::warn!("Skipping sheet row {}: no user with email {}", row_number, email);
        return Ok(None);
    };

    let reading = insert_health_data(pool, user.id, &new_reading).await?;
    if let Err(e) = analyze_and_store(pool, &reading).await {
        tracing::error!("Failed to analyze imported reading {}: {}", reading.id, e);
    }
    Ok(Some(user.id))
}

async fn notify_imported(pool: &PgPool, imported_per_user: &HashMap<Uuid, usize>) {
    for (user_id, count) in imported_per_user {
        let message = if *count == 1 {
            "1 reading was imported from your spreadsheet.".to_string()
        } else {
            format!("{} readings were imported from your spreadsheet.", count)
        };
        if let Err(e) = notify_user(
            pool,
            *user_id,
            NotificationType::ImportReport,
            "New readings imported".to_string(),
            message,
            None,
        )
        .await
        {
            tracing::error!("Failed to send import report to {}: {}", user_id, e);
        }
    }
}
