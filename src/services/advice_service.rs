use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tokio_retry::{strategy::FixedInterval, Retry};

use crate::config::advice::AdviceSettings;
use crate::models::analysis::{AdviceSource, HealthAnalysis, RiskLevel};

/// Total calls to the model per analysis, the first one included.
const MAX_ATTEMPTS: usize = 3;
const RETRY_INTERVAL_MS: u64 = 1000;

#[derive(Debug, ThisError)]
pub enum AdviceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Advice request timed out")]
    Timeout,
    #[error("Rate limited by advice service")]
    RateLimited,
    #[error("Advice service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Invalid advice response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Rephrases an analysis with a generative model. Without configuration, or
/// when the model keeps failing, the rule-table suggestion is returned.
#[derive(Clone)]
pub struct AdviceService {
    client: Client,
    settings: AdviceSettings,
}

impl AdviceService {
    pub fn new(settings: AdviceSettings) -> Result<Self, AdviceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs + 5))
            .build()?;
        if settings.enabled {
            tracing::info!("Advice model {} configured", settings.model);
        }
        Ok(Self { client, settings })
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    pub async fn advise(&self, analysis: &HealthAnalysis) -> (String, AdviceSource) {
        if !self.settings.enabled {
            return (analysis.suggestion.clone(), AdviceSource::Rules);
        }

        let prompt = build_prompt(analysis);
        match Retry::spawn(retry_strategy(), || self.call_model(&prompt)).await {
            Ok(advice) => (advice, AdviceSource::Model),
            Err(e) => {
                tracing::error!("Advice model failed after {} attempts: {}", MAX_ATTEMPTS, e);
                (analysis.suggestion.clone(), AdviceSource::Rules)
            }
        }
    }

    async fn call_model(&self, prompt: &str) -> Result<String, AdviceError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt.to_string() }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.settings.api_key.expose_secret())])
            .json(&body)
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .send()
            .await
            .map_err(|e| if e.is_timeout() { AdviceError::Timeout } else { AdviceError::Network(e) })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => AdviceError::RateLimited,
                500..=599 => AdviceError::ServiceUnavailable(error_text),
                _ => AdviceError::InvalidResponse(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_text(parsed)
    }
}

/// Delays between attempts; `Retry` makes the first call without waiting.
fn retry_strategy() -> impl Iterator<Item = Duration> {
    FixedInterval::from_millis(RETRY_INTERVAL_MS).take(MAX_ATTEMPTS - 1)
}

fn extract_text(response: GenerateContentResponse) -> Result<String, AdviceError> {
    let text = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(AdviceError::InvalidResponse("Empty content".to_string()));
    }
    Ok(text)
}

fn build_prompt(analysis: &HealthAnalysis) -> String {
    let tone = match analysis.risk_level {
        RiskLevel::Good => "encouraging",
        RiskLevel::Normal => "friendly and motivating",
        RiskLevel::Bad => "calm but clear about seeking medical help where appropriate",
    };
    format!(
        "You are a health coach. Rewrite the following smartwatch analysis as short, {} \
         advice for the user in at most five sentences. Do not add diagnoses.\n\n\
         Overall rating: {}\n\nFindings:\n{}\n\nRule-based suggestions:\n{}",
        tone, analysis.risk_level, analysis.interpretation, analysis.suggestion
    )
}
