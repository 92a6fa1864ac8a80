use std::collections::HashSet;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::analysis::thresholds;
use crate::models::analysis::RiskLevel;
use crate::models::health_data::HealthData;

/// Weekly aggregate of a user's readings, before it is persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub reading_count: i64,
    pub avg_heart_rate: Option<f64>,
    pub min_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub total_steps: Option<i64>,
    pub avg_daily_steps: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub total_calories: Option<f64>,
    pub avg_daily_calories: Option<f64>,
    pub avg_spo2: Option<f64>,
    pub min_spo2: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub good_count: i64,
    pub normal_count: i64,
    pub bad_count: i64,
    pub risk_level: Option<RiskLevel>,
}

/// ISO week containing `date`: Monday 00:00 UTC up to the next Monday (exclusive).
pub fn week_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    let start = monday.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(7))
}

/// Start of the week before the one containing `today`.
pub fn previous_week_start(today: NaiveDate) -> NaiveDate {
    let (start, _) = week_bounds(today - Duration::days(7));
    start.date_naive()
}

struct Series {
    values: Vec<f64>,
    days: HashSet<NaiveDate>,
}

impl Series {
    fn collect<F>(readings: &[HealthData], pick: F) -> Self
    where
        F: Fn(&HealthData) -> Option<f64>,
    {
        let mut values = Vec::new();
        let mut days = HashSet::new();
        for reading in readings {
            if let Some(value) = pick(reading) {
                values.push(value);
                days.insert(reading.recorded_at.date_naive());
            }
        }
        Self { values, days }
    }

    fn sum(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum())
        }
    }

    fn mean(&self) -> Option<f64> {
        self.sum().map(|total| total / self.values.len() as f64)
    }

    fn daily_mean(&self) -> Option<f64> {
        self.sum().map(|total| total / self.days.len() as f64)
    }

    fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

/// Aggregate one period of readings.
///
/// `risk_levels` are the stored analyses of those readings and only feed the
/// per-level counters. The summary's own risk is the worst classification of
/// the averaged metrics, using daily averages for steps and calories.
pub fn summarize(readings: &[HealthData], risk_levels: &[RiskLevel]) -> SummaryStats {
    let heart_rate = Series::collect(readings, |r| r.heart_rate.map(f64::from));
    let steps = Series::collect(readings, |r| r.steps.map(f64::from));
    let sleep = Series::collect(readings, |r| r.sleep_hours.map(f64::from));
    let calories = Series::collect(readings, |r| r.calories.map(f64::from));
    let spo2 = Series::collect(readings, |r| r.spo2.map(f64::from));
    let temperature = Series::collect(readings, |r| r.temperature.map(f64::from));

    let count = |level: RiskLevel| risk_levels.iter().filter(|l| **l == level).count() as i64;

    let mut stats = SummaryStats {
        reading_count: readings.len() as i64,
        avg_heart_rate: heart_rate.mean(),
        min_heart_rate: heart_rate.min(),
        max_heart_rate: heart_rate.max(),
        total_steps: steps.sum().map(|s| s as i64),
        avg_daily_steps: steps.daily_mean(),
        avg_sleep_hours: sleep.mean(),
        total_calories: calories.sum(),
        avg_daily_calories: calories.daily_mean(),
        avg_spo2: spo2.mean(),
        min_spo2: spo2.min(),
        avg_temperature: temperature.mean(),
        good_count: count(RiskLevel::Good),
        normal_count: count(RiskLevel::Normal),
        bad_count: count(RiskLevel::Bad),
        risk_level: None,
    };
    stats.risk_level = overall_risk(&stats);
    stats
}

fn overall_risk(stats: &SummaryStats) -> Option<RiskLevel> {
    [
        stats.avg_heart_rate.map(thresholds::classify_heart_rate),
        stats.avg_daily_steps.map(thresholds::classify_steps),
        stats.avg_sleep_hours.map(thresholds::classify_sleep),
        stats.avg_daily_calories.map(thresholds::classify_calories),
        stats.avg_spo2.map(thresholds::classify_spo2),
        stats.avg_temperature.map(thresholds::classify_temperature),
    ]
    .into_iter()
    .flatten()
    .max()
}
