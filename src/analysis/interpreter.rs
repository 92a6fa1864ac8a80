use crate::analysis::thresholds::{thresholds_for, Deviation};
use crate::models::analysis::{Metric, MetricFinding, RiskLevel};
use crate::models::health_data::VitalSigns;

pub const ALL_GOOD_SUGGESTION: &str =
    "All measured vitals are within healthy ranges. Keep up your current routine.";

/// Result of running the rule table over one reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub risk_level: RiskLevel,
    pub interpretation: String,
    pub suggestion: String,
    pub findings: Vec<MetricFinding>,
}

/// Classify every metric present in `vitals`.
///
/// Returns `None` when the reading carries no metric at all; callers skip
/// such rows. The overall risk is the worst finding.
pub fn analyze(vitals: &VitalSigns) -> Option<AnalysisOutcome> {
    let findings: Vec<MetricFinding> = present_metrics(vitals)
        .into_iter()
        .map(|(metric, value)| evaluate(metric, value))
        .collect();

    let risk_level = findings.iter().map(|f| f.risk_level).max()?;

    let interpretation = findings
        .iter()
        .map(|f| f.interpretation.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let suggestions: Vec<&str> = findings
        .iter()
        .filter(|f| f.risk_level != RiskLevel::Good)
        .map(|f| f.suggestion.as_str())
        .collect();
    let suggestion = if suggestions.is_empty() {
        ALL_GOOD_SUGGESTION.to_string()
    } else {
        suggestions.join("\n")
    };

    Some(AnalysisOutcome {
        risk_level,
        interpretation,
        suggestion,
        findings,
    })
}

fn present_metrics(vitals: &VitalSigns) -> Vec<(Metric, f64)> {
    [
        (Metric::HeartRate, vitals.heart_rate.map(f64::from)),
        (Metric::Steps, vitals.steps.map(f64::from)),
        (Metric::Sleep, vitals.sleep_hours.map(f64::from)),
        (Metric::Calories, vitals.calories.map(f64::from)),
        (Metric::Spo2, vitals.spo2.map(f64::from)),
        (Metric::Temperature, vitals.temperature.map(f64::from)),
    ]
    .into_iter()
    .filter_map(|(metric, value)| value.map(|v| (metric, v)))
    .collect()
}

pub fn evaluate(metric: Metric, value: f64) -> MetricFinding {
    let thresholds = thresholds_for(metric);
    let risk_level = thresholds.classify(value);
    let deviation = thresholds.deviation(value);
    let (interpretation, suggestion) = describe(metric, risk_level, deviation, value);

    MetricFinding {
        metric,
        value,
        risk_level,
        interpretation,
        suggestion,
    }
}

fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::HeartRate | Metric::Steps | Metric::Calories | Metric::Spo2 => {
            format!("{:.0} {}", value, metric.unit())
        }
        Metric::Sleep | Metric::Temperature => format!("{:.1} {}", value, metric.unit()),
    }
}

fn describe(metric: Metric, level: RiskLevel, deviation: Deviation, value: f64) -> (String, String) {
    use Deviation::*;
    use RiskLevel::*;

    let shown = format_value(metric, value);
    let label = metric.label();

    let (state, suggestion) = match (metric, level, deviation) {
        (_, Good, _) => ("is within the healthy range", "Keep it up."),

        (Metric::HeartRate, Normal, Low) => (
            "is slightly below the typical resting range",
            "A low resting pulse is common for fit people; watch for dizziness or fatigue.",
        ),
        (Metric::HeartRate, Normal, _) => (
            "is slightly elevated",
            "Rest, hydrate and measure again once you are calm.",
        ),
        (Metric::HeartRate, Bad, Low) => (
            "is unusually low",
            "If you feel faint or short of breath, contact a doctor.",
        ),
        (Metric::HeartRate, Bad, _) => (
            "is high for a resting measurement",
            "Stop strenuous activity and seek medical advice if it stays this high.",
        ),

        (Metric::Steps, Normal, _) => (
            "is below the daily goal of 10000",
            "Add a short walk to your day to reach the daily goal.",
        ),
        (Metric::Steps, Bad, _) => (
            "shows very little movement",
            "Try to break up long sitting periods with regular walks.",
        ),

        (Metric::Sleep, Normal, Low) => (
            "is a little short",
            "Aim for 7 to 9 hours by going to bed a bit earlier.",
        ),
        (Metric::Sleep, Normal, _) => (
            "is a little longer than recommended",
            "Keep a regular wake-up time to avoid oversleeping.",
        ),
        (Metric::Sleep, Bad, Low) => (
            "is far too short",
            "Sustained short sleep affects health; prioritise rest and reduce screen time before bed.",
        ),
        (Metric::Sleep, Bad, _) => (
            "is excessive",
            "Regularly sleeping this long can signal an underlying issue; consider talking to a doctor.",
        ),

        (Metric::Calories, Normal, _) => (
            "is a moderate activity level",
            "A little more activity would bring you to a healthy energy expenditure.",
        ),
        (Metric::Calories, Bad, _) => (
            "indicates very low activity",
            "Plan at least 30 minutes of moderate exercise today.",
        ),

        (Metric::Spo2, Normal, _) => (
            "is slightly below normal",
            "Take a few deep breaths and measure again while sitting still.",
        ),
        (Metric::Spo2, Bad, _) => (
            "is low",
            "Low blood oxygen can be serious; seek medical attention if you feel short of breath.",
        ),

        (Metric::Temperature, Normal, Low) => (
            "is slightly below normal",
            "Warm up and measure again in a while.",
        ),
        (Metric::Temperature, Normal, _) => (
            "is slightly raised",
            "Rest, drink fluids and keep an eye on your temperature.",
        ),
        (Metric::Temperature, Bad, Low) => (
            "is abnormally low",
            "Get warm immediately and seek medical help if it does not recover.",
        ),
        (Metric::Temperature, Bad, _) => (
            "indicates a fever",
            "Rest, stay hydrated and consult a doctor if the fever persists.",
        ),
    };

    (
        format!("{} of {} {} ({}).", label, shown, state, level),
        suggestion.to_string(),
    )
}
