use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error as ThisError;
use tokio::sync::Mutex;

use crate::config::import::ImportSettings;

/// Last column read from the sheet (`email` .. `device_id`).
const LAST_COLUMN: &str = "I";

#[derive(Debug, ThisError)]
pub enum ImportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OAuth token exchange failed: {0}")]
    Auth(String),
    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Invalid Sheets API URL: {0}")]
    InvalidUrl(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A spreadsheet readable in row pages. Row numbers are 1-based like in the sheet UI.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Stable key for the watermark of this source.
    fn source_id(&self) -> String;

    /// Up to `limit` rows starting at `start_row`. Fewer rows means the end of the sheet.
    async fn fetch_rows(&self, start_row: i64, limit: u32) -> Result<Vec<Vec<String>>, ImportError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Reads a Google Sheet through the v4 values API, authenticating with an
/// OAuth refresh token.
pub struct GoogleSheetsSource {
    client: Client,
    settings: ImportSettings,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsSource {
    pub fn new(settings: ImportSettings) -> Result<Self, ImportError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            settings,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ImportError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Refreshing Google OAuth access token");
        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.expose_secret()),
                ("refresh_token", self.settings.refresh_token.expose_secret()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::Auth(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        // Refresh a minute early
        let lifetime = token.expires_in.unwrap_or(3600).saturating_sub(60);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        Ok(token.access_token)
    }

    fn range_url(&self, start_row: i64, end_row: i64) -> Result<Url, ImportError> {
        let mut url = Url::parse(&self.settings.api_base_url)
            .map_err(|e| ImportError::InvalidUrl(e.to_string()))?;
        let range = sheet_range(&self.settings.sheet_name, start_row, end_row);
        url.path_segments_mut()
            .map_err(|_| ImportError::InvalidUrl(self.settings.api_base_url.clone()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.settings.spreadsheet_id.as_str(), "values", range.as_str()]);
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        Ok(url)
    }
}

/// A1 range covering the import columns of rows `start..=end`.
pub fn sheet_range(sheet_name: &str, start_row: i64, end_row: i64) -> String {
    let quoted = format!("'{}'", sheet_name.replace('\'', "''"));
    format!("{}!A{}:{}{}", quoted, start_row, LAST_COLUMN, end_row)
}

#[async_trait]
impl SheetSource for GoogleSheetsSource {
    fn source_id(&self) -> String {
        self.settings.source_id()
    }

    #[tracing::instrument(name = "Fetch sheet rows", skip(self))]
    async fn fetch_rows(&self, start_row: i64, limit: u32) -> Result<Vec<Vec<String>>, ImportError> {
        let end_row = start_row + limit as i64 - 1;
        let url = self.range_url(start_row, end_row)?;
        let token = self.access_token().await?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::Api { status, body });
        }

        let range: ValueRange = response.json().await?;
        tracing::debug!("Fetched {} rows from sheet", range.values.len());
        Ok(range.values)
    }
}
