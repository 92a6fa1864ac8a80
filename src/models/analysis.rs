use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef, Postgres};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Risk taxonomy attached to analyses and summaries. Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Good,
    Normal,
    Bad,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Good => "good",
            RiskLevel::Normal => "normal",
            RiskLevel::Bad => "bad",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "good" => Some(RiskLevel::Good),
            "normal" => Some(RiskLevel::Normal),
            "bad" => Some(RiskLevel::Bad),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RiskLevel::from_str(&value).ok_or_else(|| format!("Unknown risk level: {}", value))
    }
}

// Nullable TEXT columns decode to `Option<RiskLevel>`.
impl sqlx::Type<Postgres> for RiskLevel {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, Postgres> for RiskLevel {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as sqlx::Decode<Postgres>>::decode(value)?;
        RiskLevel::from_str(text).ok_or_else(|| format!("Unknown risk level: {}", text).into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HeartRate,
    Steps,
    Sleep,
    Calories,
    Spo2,
    Temperature,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::HeartRate => "Heart rate",
            Metric::Steps => "Steps",
            Metric::Sleep => "Sleep",
            Metric::Calories => "Active calories",
            Metric::Spo2 => "Blood oxygen",
            Metric::Temperature => "Body temperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::HeartRate => "bpm",
            Metric::Steps => "steps",
            Metric::Sleep => "h",
            Metric::Calories => "kcal",
            Metric::Spo2 => "%",
            Metric::Temperature => "°C",
        }
    }
}

/// Classification of a single metric of a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFinding {
    pub metric: Metric,
    pub value: f64,
    pub risk_level: RiskLevel,
    pub interpretation: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HealthAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub health_data_id: Uuid,
    #[sqlx(try_from = "String")]
    pub risk_level: RiskLevel,
    pub interpretation: String,
    pub suggestion: String,
    pub findings: Json<Vec<MetricFinding>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub risk_level: Option<RiskLevel>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceSource {
    Model,
    Rules,
}

#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub analysis_id: Uuid,
    pub advice: String,
    pub source: AdviceSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_levels_order_from_good_to_bad() {
        assert!(RiskLevel::Good < RiskLevel::Normal);
        assert!(RiskLevel::Normal < RiskLevel::Bad);
        assert_eq!(
            [RiskLevel::Normal, RiskLevel::Bad, RiskLevel::Good].into_iter().max(),
            Some(RiskLevel::Bad)
        );
    }

    #[test]
    fn risk_level_string_conversions() {
        assert_eq!(RiskLevel::try_from("normal".to_string()), Ok(RiskLevel::Normal));
        assert!(RiskLevel::try_from("awful".to_string()).is_err());
        assert_eq!(serde_json::to_value(RiskLevel::Bad).unwrap(), "bad");
    }
}
