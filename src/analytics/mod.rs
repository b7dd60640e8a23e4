//! Performance analytics over saved matches

pub mod history;
pub mod metrics;
pub mod upcoming;

pub use history::{recent_results, RecentResult};
pub use metrics::{analyze_by_odds_range, calculate_metrics, BankrollMetrics, DimensionAnalysis};
pub use upcoming::{upcoming_matches, UpcomingMatch};
