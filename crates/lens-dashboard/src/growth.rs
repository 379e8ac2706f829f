//! Period-over-period and year-over-year growth calculation

use crate::statements::NormalizedMetric;
use serde::{Deserialize, Serialize};

/// Quarterly cadence: a year-over-year comparison looks 4 periods back
pub const YOY_STEP: usize = 4;

/// Growth deltas for one period of a metric series.
///
/// `None` is the explicit "undefined" marker: there is no prior period, the
/// prior value is zero, or the metric is absent upstream. Never infinity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrowthRecord {
    /// The period's value
    pub value: f64,
    /// Quarter-over-quarter percentage change
    pub qoq: Option<f64>,
    /// Year-over-year percentage change
    pub yoy: Option<f64>,
}

/// Compute growth records for a normalized metric, one per period.
///
/// An absent metric (`present=false`) produces records with all deltas
/// undefined rather than a spurious 0% series.
pub fn compute_growth(metric: &NormalizedMetric) -> Vec<GrowthRecord> {
    metric
        .values
        .iter()
        .enumerate()
        .map(|(i, &value)| GrowthRecord {
            value,
            qoq: delta_against(metric, i, 1),
            yoy: delta_against(metric, i, YOY_STEP),
        })
        .collect()
}

fn delta_against(metric: &NormalizedMetric, index: usize, step: usize) -> Option<f64> {
    if !metric.present || index < step {
        return None;
    }
    let prior = metric.values[index - step];
    if prior == 0.0 {
        return None;
    }
    let current = metric.values[index];
    Some((current - prior) / prior.abs() * 100.0)
}
