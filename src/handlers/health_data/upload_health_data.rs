use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use thiserror::Error as ThisError;

use crate::db::health_data::insert_health_data;
use crate::handlers::caller_id;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::health_data::UploadReport;
use crate::ok_or_return;
use crate::services::analysis_service::analyze_and_store;
use crate::utils::reading_parser::parse_csv;

const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MiB
const UPLOAD_DEVICE: &str = "upload";

#[derive(Debug, MultipartForm)]
pub struct HealthDataUploadForm {
    #[multipart(limit = "5MiB")]
    pub file: TempFile,
}

#[derive(Debug, ThisError)]
pub enum UploadError {
    #[error("Only .csv files are accepted")]
    NotCsv,
    #[error("File exceeds the maximum size of 5 MiB")]
    TooLarge,
    #[error("Uploaded file is empty")]
    Empty,
    #[error("Failed to read uploaded file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl UploadError {
    fn into_response(self) -> HttpResponse {
        let message = self.to_string();
        match self {
            UploadError::Io(_) => {
                tracing::error!("{}", message);
                HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to process file"))
            }
            UploadError::TooLarge => HttpResponse::PayloadTooLarge().json(ApiResponse::<()>::error(message)),
            _ => HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)),
        }
    }
}

fn validate_file(file: &TempFile) -> Result<(), UploadError> {
    let is_csv = file
        .file_name
        .as_deref()
        .map(|name| name.to_lowercase().ends_with(".csv"))
        .unwrap_or(false);
    if !is_csv {
        return Err(UploadError::NotCsv);
    }
    if file.size > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }
    if file.size == 0 {
        return Err(UploadError::Empty);
    }
    Ok(())
}

/// Store every valid row of an uploaded CSV and report the rejected ones.
#[tracing::instrument(
    name = "Upload health data",
    skip(form, pool, claims),
    fields(
        username = %claims.username,
        file_name = %form.file.file_name.as_deref().unwrap_or("unknown")
    )
)]
pub async fn upload_health_data(
    MultipartForm(form): MultipartForm<HealthDataUploadForm>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>,
) -> HttpResponse {
    let user_id = ok_or_return!(caller_id(&claims));

    if let Err(e) = validate_file(&form.file) {
        return e.into_response();
    }

    let bytes = match tokio::fs::read(form.file.file.path()).await {
        Ok(bytes) => bytes,
        Err(e) => return UploadError::from(e).into_response(),
    };

    let (accepted, rejected) = match parse_csv(&bytes, UPLOAD_DEVICE) {
        Ok(parsed) => parsed,
        Err(e) => return UploadError::from(e).into_response(),
    };
    if accepted.is_empty() && rejected.is_empty() {
        return UploadError::Empty.into_response();
    }

    let mut imported = 0;
    let mut interrupted = false;
    for new_reading in &accepted {
        let reading = match insert_health_data(&pool, user_id, new_reading).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::error!("Upload stopped after {} stored rows: {}", imported, e);
                interrupted = true;
                break;
            }
        };
        imported += 1;

        if let Err(e) = analyze_and_store(&pool, &reading).await {
            tracing::error!("Analysis of uploaded reading {} failed: {}", reading.id, e);
        }
    }

    let report = UploadReport {
        imported,
        not_stored: accepted.len() - imported,
        rejected,
    };
    if interrupted {
        return HttpResponse::InternalServerError().json(ApiResponse::error_with_data(
            "Database error, upload stopped partway",
            report,
        ));
    }

    tracing::info!("Upload stored {} readings, rejected {}", imported, report.rejected.len());
    HttpResponse::Ok().json(ApiResponse::success("Upload processed", report))
}
