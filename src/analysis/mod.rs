pub mod thresholds;
pub mod interpreter;
pub mod aggregate;

pub use interpreter::{analyze, AnalysisOutcome};
pub use aggregate::{summarize, week_bounds, previous_week_start, SummaryStats};
