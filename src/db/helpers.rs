//! Helpers that turn database results into handler responses.
//!
//! ```ignore
//! let reading = ok_or_return!(require_record(
//!     get_reading(pool, user_id, id).await,
//!     "Health data not found"
//! ));
//! ```

use actix_web::HttpResponse;

use crate::models::common::ApiResponse;

/// Early-return the `HttpResponse` carried by a `DbResult` error.
#[macro_export]
macro_rules! ok_or_return {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(response) => return response,
        }
    };
}

pub type DbResult<T> = Result<T, HttpResponse>;

/// Unwrap an optional database result, returning NotFound if None.
pub fn require_record<T>(
    result: Result<Option<T>, sqlx::Error>,
    not_found_message: &str,
) -> DbResult<T> {
    match result {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found_message))),
        Err(e) => Err(database_error(e)),
    }
}

/// Unwrap a database result, returning InternalServerError on error.
pub fn db_result<T>(result: Result<T, sqlx::Error>) -> DbResult<T> {
    result.map_err(database_error)
}

/// Map an "affected rows" style result to NotFound when nothing changed.
pub fn require_affected(result: Result<bool, sqlx::Error>, not_found_message: &str) -> DbResult<()> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found_message))),
        Err(e) => Err(database_error(e)),
    }
}

pub fn database_error(e: sqlx::Error) -> HttpResponse {
    tracing::error!("Database error: {}", e);
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
}

/// True when the error is a Postgres unique-constraint violation.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
