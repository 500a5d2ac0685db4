//! Final report model.

use super::chart::Chart;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the handler knows at job completion: a snapshot of every chart
/// plus the statistics and banner mappings relayed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    /// Chart snapshot keyed by chart name.
    pub charts: BTreeMap<String, Chart>,
    /// Externally computed statistics.
    pub statistics: BTreeMap<String, String>,
    /// Banner (runtime) statistics.
    pub banner: BTreeMap<String, String>,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
}

impl FinalReport {
    /// Creates a new report stamped with the current time.
    #[must_use]
    pub fn new(
        charts: BTreeMap<String, Chart>,
        statistics: BTreeMap<String, String>,
        banner: BTreeMap<String, String>,
    ) -> Self {
        Self {
            charts,
            statistics,
            banner,
            generated_at: Utc::now(),
        }
    }

    /// Total number of chart points in the report.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.charts.values().map(Chart::point_count).sum()
    }
}
