use serde::Deserialize;
use secrecy::SecretString;

/// Spreadsheet the import job polls for new readings.
#[derive(Debug, Deserialize, Clone)]
pub struct ImportSettings {
    pub enabled: bool,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub page_size: u32,
    pub client_id: String,
    pub client_secret: SecretString,
    pub refresh_token: SecretString,
    pub token_url: String,
    pub api_base_url: String,
}

impl ImportSettings {
    /// Key under which the watermark of this sheet is stored.
    pub fn source_id(&self) -> String {
        format!("{}:{}", self.spreadsheet_id, self.sheet_name)
    }
}
