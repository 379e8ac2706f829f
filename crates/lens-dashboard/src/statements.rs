//! Quarterly statement tables and metric resolution
//!
//! A [`StatementTable`] holds line items keyed by name, each with one raw
//! value per reporting period. Upstream feeds are inconsistent about which
//! line items exist and what they are called, so lookup goes through
//! [`StatementTable::resolve`], which never fails: an absent metric comes
//! back as a zero-filled series with `present=false`, and consumers are
//! expected to render a "Data Unavailable" placeholder for it.

use crate::normalize::coerce;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Placeholder text consumers must render for absent data
pub const PLACEHOLDER_TEXT: &str = "Data Unavailable";

/// A metric series with an explicit presence flag.
///
/// `values` always has exactly one finite entry per table period. `present`
/// is the missing-value policy: a zero in `values` only means "metric value
/// is zero" when `present` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMetric {
    /// Requested metric name
    pub name: String,
    /// Whether the metric existed in the source table
    pub present: bool,
    /// One finite value per period, oldest-first
    pub values: Vec<f64>,
}

impl NormalizedMetric {
    /// An absent metric: zero-filled series of the given length
    pub fn absent(name: impl Into<String>, period_count: usize) -> Self {
        Self {
            name: name.into(),
            present: false,
            values: vec![0.0; period_count],
        }
    }

    /// Most recent value (0.0 when the series is empty)
    pub fn latest(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

/// Quarterly financial statement table.
///
/// Invariant: every row has exactly `periods.len()` entries; periods are
/// ordered chronologically, oldest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementTable {
    periods: Vec<NaiveDate>,
    rows: HashMap<String, Vec<Value>>,
}

impl StatementTable {
    /// Create an empty table over the given period index (oldest-first)
    pub fn new(periods: Vec<NaiveDate>) -> Self {
        Self {
            periods,
            rows: HashMap::new(),
        }
    }

    /// Period index, oldest-first
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Number of reporting periods
    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row names present in the table
    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Insert a row, coercing its length to the period count.
    ///
    /// Short rows are padded with nulls at the old end; long rows are
    /// truncated from the old end. Row length mismatches come from upstream
    /// restatements and must not poison the whole table.
    pub fn insert_row(&mut self, name: impl Into<String>, mut values: Vec<Value>) {
        let want = self.periods.len();
        if values.len() < want {
            let mut padded = vec![Value::Null; want - values.len()];
            padded.append(&mut values);
            values = padded;
        } else if values.len() > want {
            values.drain(..values.len() - want);
        }
        self.rows.insert(name.into(), values);
    }

    /// Whether a line item exists under exactly this name
    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    /// Resolve a metric by exact name.
    ///
    /// Absent metrics return `present=false` with a zero series of the
    /// table's period length. Present metrics have every entry normalized.
    pub fn resolve(&self, metric_name: &str) -> NormalizedMetric {
        match self.rows.get(metric_name) {
            Some(raw) => NormalizedMetric {
                name: metric_name.to_string(),
                present: true,
                values: raw.iter().map(coerce).collect(),
            },
            None => NormalizedMetric::absent(metric_name, self.periods.len()),
        }
    }

    /// Resolve the first name in a fallback chain that exists.
    ///
    /// Upstream feeds disagree on line-item naming (e.g. "EBITDA" vs
    /// "Normalized EBITDA"); the returned metric keeps the first requested
    /// name so downstream labels stay stable.
    pub fn resolve_first(&self, names: &[&str]) -> NormalizedMetric {
        for name in names {
            if self.contains(name) {
                let mut metric = self.resolve(name);
                metric.name = (*names.first().unwrap_or(name)).to_string();
                return metric;
            }
        }
        NormalizedMetric::absent(names.first().copied().unwrap_or(""), self.periods.len())
    }

    /// Resolve a row whose name contains every given fragment.
    ///
    /// Used for CapEx, which upstream reports under several spellings that
    /// all contain "Capital" and "Expenditure".
    pub fn resolve_containing(&self, label: &str, fragments: &[&str]) -> NormalizedMetric {
        let found = self
            .rows
            .keys()
            .find(|name| fragments.iter().all(|f| name.contains(f)));

        match found {
            Some(name) => {
                let mut metric = self.resolve(&name.clone());
                metric.name = label.to_string();
                metric
            }
            None => NormalizedMetric::absent(label, self.periods.len()),
        }
    }
}
