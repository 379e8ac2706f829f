//! Rendered dashboard report types

use crate::api::market::CompanySnapshot;
use crate::api::markets::MarketItem;
use crate::growth::GrowthRecord;
use crate::insight::{InsightSection, SegmentEstimate};
use crate::signals::MomentumSignals;
use crate::statements::{NormalizedMetric, PLACEHOLDER_TEXT};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One financial metric ready to render: values plus growth deltas.
///
/// `data_present` is false when the metric was absent upstream; renderers
/// must show [`PLACEHOLDER_TEXT`] instead of the zero series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSection {
    pub name: String,
    pub data_present: bool,
    pub values: Vec<f64>,
    pub growth: Vec<GrowthRecord>,
}

impl MetricSection {
    /// Build from a resolved metric and its growth series
    pub fn new(metric: &NormalizedMetric, growth: Vec<GrowthRecord>) -> Self {
        Self {
            name: metric.name.clone(),
            data_present: metric.present,
            values: metric.values.clone(),
            growth,
        }
    }

    /// Text to render for period `index` (placeholder when absent)
    pub fn cell(&self, index: usize) -> String {
        if !self.data_present {
            return PLACEHOLDER_TEXT.to_string();
        }
        self.values
            .get(index)
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string())
    }
}

/// Full dashboard for one ticker.
///
/// Every field degrades independently; a failed fetch empties its own
/// section and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub ticker: String,
    pub generated_at: DateTime<Utc>,
    /// Quote snapshot, absent when the quote fetch failed
    pub snapshot: Option<CompanySnapshot>,
    /// Statement periods, oldest-first
    pub periods: Vec<NaiveDate>,
    /// Momentum signals, absent when price history failed
    pub signals: Option<MomentumSignals>,
    /// Financial metrics in statement order
    pub metric_sections: Vec<MetricSection>,
    /// Generated insight sections in render order
    pub insight_sections: Vec<InsightSection>,
    /// Open prediction markets about the company (may be empty)
    pub markets: Vec<MarketItem>,
    /// Direct competitor tickers (may be empty)
    pub competitors: Vec<String>,
    /// Segment revenue estimates (may be empty)
    pub segments: Vec<SegmentEstimate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_metric_renders_placeholder() {
        let metric = NormalizedMetric::absent("Gross Profit", 4);
        let section = MetricSection::new(&metric, Vec::new());

        assert!(!section.data_present);
        assert_eq!(section.cell(0), PLACEHOLDER_TEXT);
        assert_eq!(section.cell(3), PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_present_metric_renders_values() {
        let metric = NormalizedMetric {
            name: "Total Revenue".to_string(),
            present: true,
            values: vec![100.0, 120.5],
        };
        let section = MetricSection::new(&metric, Vec::new());

        assert_eq!(section.cell(1), "120.5");
        // Out-of-range period still degrades to the placeholder
        assert_eq!(section.cell(9), PLACEHOLDER_TEXT);
    }
}
