use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized view of the OAuth usage endpoint.
///
/// Percentages are utilization values in the 0-100 range. Reset times are
/// `None` when the API omitted the bucket or sent a timestamp that did not
/// parse. `is_stale` is only ever set by a cache read past its TTL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSnapshot {
    /// Rolling 5-hour window
    pub block_percentage: f64,
    pub block_reset_time: Option<DateTime<Utc>>,

    /// Rolling 7-day window, optionally split by model family
    pub weekly_percentage: f64,
    pub opus_percentage: f64,
    pub sonnet_percentage: f64,
    pub week_reset_time: Option<DateTime<Utc>>,

    pub is_stale: bool,
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Both model-family buckets carry usage
    pub fn has_model_breakdown(&self) -> bool {
        self.opus_percentage > 0.0 && self.sonnet_percentage > 0.0
    }
}
