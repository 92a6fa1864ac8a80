//! Turns loosely typed rows (CSV uploads, spreadsheet cells) into readings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::models::health_data::{DataSource, NewHealthData, RejectedRow, VitalSigns};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// One row as text, before validation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawReading {
    pub recorded_at: String,
    #[serde(default)]
    pub heart_rate: Option<String>,
    #[serde(default)]
    pub steps: Option<String>,
    #[serde(default)]
    pub sleep_hours: Option<String>,
    #[serde(default)]
    pub calories: Option<String>,
    #[serde(default)]
    pub spo2: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

impl RawReading {
    pub fn into_new(self, source: DataSource, default_device: &str) -> Result<NewHealthData, String> {
        let recorded_at = parse_timestamp(&self.recorded_at)?;
        let vitals = VitalSigns {
            heart_rate: parse_number("heart_rate", self.heart_rate.as_deref())?,
            steps: parse_steps(self.steps.as_deref())?,
            sleep_hours: parse_number("sleep_hours", self.sleep_hours.as_deref())?,
            calories: parse_number("calories", self.calories.as_deref())?,
            spo2: parse_number("spo2", self.spo2.as_deref())?,
            temperature: parse_number("temperature", self.temperature.as_deref())?,
        };
        vitals.validate()?;

        let device_id = self
            .device_id
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| default_device.to_string());

        Ok(NewHealthData {
            device_id,
            recorded_at,
            vitals,
            source,
        })
    }
}

/// Accepts RFC 3339, common spreadsheet date-times (read as UTC) and bare dates.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("recorded_at is required".to_string());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(format!("Unrecognised timestamp: {}", value))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("{} is not a number: {}", name, text)),
    }
}

/// Step counts may come out of a spreadsheet as `8400.0`; anything that is
/// not a finite count is rejected rather than cast.
fn parse_steps(value: Option<&str>) -> Result<Option<i32>, String> {
    match parse_number::<f64>("steps", value)? {
        None => Ok(None),
        Some(steps) if steps.is_finite() && steps >= i32::MIN as f64 && steps <= i32::MAX as f64 => {
            Ok(Some(steps.round() as i32))
        }
        Some(_) => Err(format!("steps is not a valid count: {}", value.unwrap_or_default().trim())),
    }
}

/// Parse a CSV upload with a header row. Line numbers in the result are
/// 1-based file lines, the header being line 1.
pub fn parse_csv(
    bytes: &[u8],
    default_device: &str,
) -> Result<(Vec<NewHealthData>, Vec<RejectedRow>), csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == "recorded_at") {
        return Err(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "CSV header must contain a recorded_at column",
        )));
    }

    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    let mut last_line = 1;
    for record in reader.records() {
        let position = match &record {
            Ok(record) => record.position(),
            Err(e) => e.position(),
        };
        // Blank lines are skipped by the reader, so count from the record itself.
        let line = position.map(|p| p.line() as usize).unwrap_or(last_line + 1);
        last_line = line;

        let parsed = record
            .map_err(|e| e.to_string())
            .and_then(|record| record.deserialize::<RawReading>(Some(&headers)).map_err(|e| e.to_string()))
            .and_then(|raw| raw.into_new(DataSource::Upload, default_device));

        match parsed {
            Ok(reading) => accepted.push(reading),
            Err(reason) => rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok((accepted, rejected))
}
