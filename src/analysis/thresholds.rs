use crate::models::analysis::{Metric, RiskLevel};

/// Where a value sits relative to the healthy band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    Low,
    InRange,
    High,
}

/// Inclusive bands: values inside `good` are Good, values outside `good`
/// but inside `normal` are Normal, everything else is Bad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub good_min: f64,
    pub good_max: f64,
    pub normal_min: f64,
    pub normal_max: f64,
}

impl Thresholds {
    const fn new(good_min: f64, good_max: f64, normal_min: f64, normal_max: f64) -> Self {
        Self { good_min, good_max, normal_min, normal_max }
    }

    pub fn classify(&self, value: f64) -> RiskLevel {
        if value >= self.good_min && value <= self.good_max {
            RiskLevel::Good
        } else if value >= self.normal_min && value <= self.normal_max {
            RiskLevel::Normal
        } else {
            RiskLevel::Bad
        }
    }

    pub fn deviation(&self, value: f64) -> Deviation {
        if value < self.good_min {
            Deviation::Low
        } else if value > self.good_max {
            Deviation::High
        } else {
            Deviation::InRange
        }
    }
}

pub const HEART_RATE: Thresholds = Thresholds::new(60.0, 100.0, 50.0, 120.0);
pub const STEPS: Thresholds = Thresholds::new(10_000.0, f64::INFINITY, 5_000.0, f64::INFINITY);
pub const SLEEP_HOURS: Thresholds = Thresholds::new(7.0, 9.0, 6.0, 10.0);
pub const CALORIES: Thresholds = Thresholds::new(400.0, f64::INFINITY, 200.0, f64::INFINITY);
pub const SPO2: Thresholds = Thresholds::new(95.0, f64::INFINITY, 90.0, f64::INFINITY);
// Readings are stored as REAL; bounds that are not exact in f32 are widened
// the same way a stored value is, so a stored 36.1 still lands in its band.
pub const TEMPERATURE: Thresholds = Thresholds::new(36.1f32 as f64, 37.2f32 as f64, 35.5, 38.0);

pub fn thresholds_for(metric: Metric) -> &'static Thresholds {
    match metric {
        Metric::HeartRate => &HEART_RATE,
        Metric::Steps => &STEPS,
        Metric::Sleep => &SLEEP_HOURS,
        Metric::Calories => &CALORIES,
        Metric::Spo2 => &SPO2,
        Metric::Temperature => &TEMPERATURE,
    }
}

pub fn classify(metric: Metric, value: f64) -> RiskLevel {
    thresholds_for(metric).classify(value)
}

pub fn classify_heart_rate(bpm: f64) -> RiskLevel {
    HEART_RATE.classify(bpm)
}

pub fn classify_steps(steps: f64) -> RiskLevel {
    STEPS.classify(steps)
}

pub fn classify_sleep(hours: f64) -> RiskLevel {
    SLEEP_HOURS.classify(hours)
}

pub fn classify_calories(kcal: f64) -> RiskLevel {
    CALORIES.classify(kcal)
}

pub fn classify_spo2(percent: f64) -> RiskLevel {
    SPO2.classify(percent)
}

pub fn classify_temperature(celsius: f64) -> RiskLevel {
    TEMPERATURE.classify(celsius)
}
