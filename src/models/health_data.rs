use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::analysis::HealthAnalysis;

/// Where a reading entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Api,
    Upload,
    Import,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Api => "api",
            DataSource::Upload => "upload",
            DataSource::Import => "import",
        }
    }
}

impl TryFrom<String> for DataSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "api" => Ok(DataSource::Api),
            "upload" => Ok(DataSource::Upload),
            "import" => Ok(DataSource::Import),
            other => Err(format!("Unknown data source: {}", other)),
        }
    }
}

/// The vital signs carried by one reading. Every metric is optional.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    #[serde(default)]
    pub heart_rate: Option<f32>,
    #[serde(default)]
    pub steps: Option<i32>,
    #[serde(default)]
    pub sleep_hours: Option<f32>,
    #[serde(default)]
    pub calories: Option<f32>,
    #[serde(default)]
    pub spo2: Option<f32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.steps.is_none()
            && self.sleep_hours.is_none()
            && self.calories.is_none()
            && self.spo2.is_none()
            && self.temperature.is_none()
    }

    /// Checks plausibility ranges for a smartwatch reading.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Reading must contain at least one metric".to_string());
        }
        check_range("heart_rate", self.heart_rate, 20.0, 250.0)?;
        check_range("steps", self.steps.map(|s| s as f32), 0.0, 100_000.0)?;
        check_range("sleep_hours", self.sleep_hours, 0.0, 24.0)?;
        check_range("calories", self.calories, 0.0, 20_000.0)?;
        check_range("spo2", self.spo2, 50.0, 100.0)?;
        check_range("temperature", self.temperature, 30.0, 45.0)?;
        Ok(())
    }
}

fn check_range(name: &str, value: Option<f32>, min: f32, max: f32) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() || v < min || v > max => {
            Err(format!("{} must be between {} and {}", name, min, max))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HealthData {
    pub id: Uuid,
    pub user_id: Uuid,
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub heart_rate: Option<f32>,
    pub steps: Option<i32>,
    pub sleep_hours: Option<f32>,
    pub calories: Option<f32>,
    pub spo2: Option<f32>,
    pub temperature: Option<f32>,
    #[sqlx(try_from = "String")]
    pub source: DataSource,
    pub created_at: DateTime<Utc>,
}

impl HealthData {
    pub fn vitals(&self) -> VitalSigns {
        VitalSigns {
            heart_rate: self.heart_rate,
            steps: self.steps,
            sleep_hours: self.sleep_hours,
            calories: self.calories,
            spo2: self.spo2,
            temperature: self.temperature,
        }
    }
}

/// A validated reading ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHealthData {
    pub device_id: String,
    pub recorded_at: DateTime<Utc>,
    pub vitals: VitalSigns,
    pub source: DataSource,
}

#[derive(Debug, Deserialize)]
pub struct CreateHealthDataRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub vitals: VitalSigns,
}

impl CreateHealthDataRequest {
    pub fn into_new(self) -> Result<NewHealthData, String> {
        self.vitals.validate()?;
        Ok(NewHealthData {
            device_id: self.device_id.unwrap_or_else(|| "unknown".to_string()),
            recorded_at: self.recorded_at.unwrap_or_else(Utc::now),
            vitals: self.vitals,
            source: DataSource::Api,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthDataQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HealthDataWithAnalysis {
    pub reading: HealthData,
    pub analysis: Option<HealthAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
    /// Valid rows left unstored because the upload was interrupted.
    pub not_stored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reading_is_rejected() {
        assert!(VitalSigns::default().validate().is_err());
    }

    #[test]
    fn implausible_values_are_rejected() {
        let vitals = VitalSigns { heart_rate: Some(400.0), ..Default::default() };
        assert!(vitals.validate().unwrap_err().contains("heart_rate"));

        let vitals = VitalSigns { spo2: Some(f32::NAN), ..Default::default() };
        assert!(vitals.validate().is_err());

        let vitals = VitalSigns { steps: Some(-1), ..Default::default() };
        assert!(vitals.validate().is_err());
    }

    #[test]
    fn request_defaults_device_and_time() {
        let request: CreateHealthDataRequest =
            serde_json::from_value(serde_json::json!({ "heart_rate": 72.0 })).unwrap();
        let new = request.into_new().unwrap();
        assert_eq!(new.device_id, "unknown");
        assert_eq!(new.vitals.heart_rate, Some(72.0));
        assert_eq!(new.source, DataSource::Api);
    }
}
