//! Market data provider backed by Yahoo Finance

use crate::error::{DashboardError, Result};
use crate::statements::StatementTable;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Point-in-time company snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub ticker: String,
    pub name: Option<String>,
    pub current_price: f64,
    pub previous_close: f64,
    pub day_low: f64,
    pub day_high: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub trailing_pe: Option<f64>,
}

/// Source of prices and quarterly financial statements
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily price bars for the trailing `days` calendar days, oldest-first
    async fn price_history(&self, ticker: &str, days: i64) -> Result<Vec<PriceBar>>;

    /// Quarterly income and cash-flow line items, periods oldest-first
    async fn quarterly_statements(&self, ticker: &str) -> Result<StatementTable>;

    /// Latest quote snapshot
    async fn snapshot(&self, ticker: &str) -> Result<CompanySnapshot>;
}

/// Yahoo Finance implementation of [`MarketDataProvider`]
pub struct YahooMarketData {
    client: reqwest::Client,
    summary_endpoint: String,
}

const DEFAULT_SUMMARY_ENDPOINT: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Income and cash-flow line items extracted from the quote summary, in
/// statement order
const STATEMENT_ROWS: &[(&str, &str, &str)] = &[
    ("incomeStatementHistoryQuarterly", "totalRevenue", "Total Revenue"),
    ("incomeStatementHistoryQuarterly", "costOfRevenue", "Cost Of Revenue"),
    ("incomeStatementHistoryQuarterly", "grossProfit", "Gross Profit"),
    ("incomeStatementHistoryQuarterly", "operatingIncome", "Operating Income"),
    ("incomeStatementHistoryQuarterly", "ebitda", "EBITDA"),
    ("incomeStatementHistoryQuarterly", "incomeTaxExpense", "Tax Provision"),
    ("incomeStatementHistoryQuarterly", "netIncome", "Net Income"),
    ("cashflowStatementHistoryQuarterly", "totalCashFromOperatingActivities", "Operating Cash Flow"),
    ("cashflowStatementHistoryQuarterly", "capitalExpenditures", "Capital Expenditure"),
];

impl YahooMarketData {
    /// Create a client against the default Yahoo endpoints
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(DashboardError::NetworkError)?;

        Ok(Self {
            client,
            summary_endpoint: DEFAULT_SUMMARY_ENDPOINT.to_string(),
        })
    }

    /// Point the quote-summary calls at a different endpoint (tests)
    pub fn with_summary_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.summary_endpoint = endpoint.into();
        self
    }

    async fn quote_summary(&self, ticker: &str, modules: &str) -> Result<Value> {
        let url = format!("{}/{ticker}", self.summary_endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("modules", modules)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::UpstreamUnavailable {
                source: "yahoo-summary".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: Value = response.json().await?;
        body.pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| DashboardError::MarketDataError(format!("empty summary for {ticker}")))
    }
}

/// Build a statement table out of a quote-summary result node.
///
/// The summary reports periods newest-first; the table is oldest-first.
fn parse_statements(result: &Value) -> StatementTable {
    let income = statement_entries(result, "incomeStatementHistoryQuarterly", "incomeStatementHistory");
    let cashflow = statement_entries(result, "cashflowStatementHistoryQuarterly", "cashflowStatements");

    let mut periods: Vec<NaiveDate> = income
        .iter()
        .filter_map(|entry| period_end(entry))
        .collect();
    if periods.is_empty() {
        periods = cashflow.iter().filter_map(|entry| period_end(entry)).collect();
    }
    periods.reverse();

    let mut table = StatementTable::new(periods);
    if table.period_count() == 0 {
        return table;
    }

    for &(module, field, label) in STATEMENT_ROWS {
        let entries = if module == "incomeStatementHistoryQuarterly" {
            &income
        } else {
            &cashflow
        };
        if entries.is_empty() {
            continue;
        }

        let mut values: Vec<Value> = entries
            .iter()
            .map(|entry| {
                entry
                    .pointer(&format!("/{field}/raw"))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect();
        values.reverse();

        // A field the source never reports stays absent rather than becoming
        // an all-null row.
        if values.iter().all(Value::is_null) {
            continue;
        }
        table.insert_row(label, values);
    }
    table
}

fn statement_entries<'a>(result: &'a Value, module: &str, list: &str) -> Vec<&'a Value> {
    result
        .pointer(&format!("/{module}/{list}"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().collect())
        .unwrap_or_default()
}

fn period_end(entry: &Value) -> Option<NaiveDate> {
    entry
        .pointer("/endDate/fmt")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    async fn price_history(&self, ticker: &str, days: i64) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;

        let end = Utc::now();
        let start = end - chrono::Duration::days(days);
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DashboardError::MarketDataError(format!("invalid start: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DashboardError::MarketDataError(format!("invalid end: {e}")))?;

        let response = provider
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }

    async fn quarterly_statements(&self, ticker: &str) -> Result<StatementTable> {
        let result = self
            .quote_summary(
                ticker,
                "incomeStatementHistoryQuarterly,cashflowStatementHistoryQuarterly",
            )
            .await?;
        Ok(parse_statements(&result))
    }

    async fn snapshot(&self, ticker: &str) -> Result<CompanySnapshot> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;

        let response = provider
            .get_latest_quotes(ticker, "1d")
            .await
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;
        let quote = response
            .last_quote()
            .map_err(|e| DashboardError::MarketDataError(e.to_string()))?;

        // Fundamentals ride along from the summary endpoint; a failure there
        // degrades the snapshot instead of failing it.
        let summary = self
            .quote_summary(ticker, "price,summaryDetail,defaultKeyStatistics")
            .await
            .ok();

        let raw = |path: &str| -> Option<f64> {
            summary
                .as_ref()
                .and_then(|s| s.pointer(path))
                .and_then(Value::as_f64)
        };
        let name = summary
            .as_ref()
            .and_then(|s| s.pointer("/price/longName"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let trailing_eps = raw("/defaultKeyStatistics/trailingEps/raw");
        let trailing_pe = raw("/summaryDetail/trailingPE/raw").or_else(|| {
            trailing_eps
                .filter(|eps| *eps != 0.0)
                .map(|eps| quote.close / eps)
        });

        Ok(CompanySnapshot {
            ticker: ticker.to_string(),
            name,
            current_price: quote.close,
            previous_close: raw("/summaryDetail/previousClose/raw").unwrap_or(quote.open),
            day_low: quote.low,
            day_high: quote.high,
            volume: quote.volume,
            market_cap: raw("/price/marketCap/raw"),
            trailing_eps,
            trailing_pe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary_fixture() -> Value {
        json!({
            "incomeStatementHistoryQuarterly": {
                "incomeStatementHistory": [
                    {
                        "endDate": { "fmt": "2025-06-30" },
                        "totalRevenue": { "raw": 120.0 },
                        "grossProfit": { "raw": 60.0 },
                        "netIncome": { "raw": 30.0 }
                    },
                    {
                        "endDate": { "fmt": "2025-03-31" },
                        "totalRevenue": { "raw": 100.0 },
                        "grossProfit": { "raw": 50.0 },
                        "netIncome": { "raw": 25.0 }
                    }
                ]
            },
            "cashflowStatementHistoryQuarterly": {
                "cashflowStatements": [
                    {
                        "endDate": { "fmt": "2025-06-30" },
                        "totalCashFromOperatingActivities": { "raw": 40.0 },
                        "capitalExpenditures": { "raw": -10.0 }
                    },
                    {
                        "endDate": { "fmt": "2025-03-31" },
                        "totalCashFromOperatingActivities": { "raw": 35.0 },
                        "capitalExpenditures": { "raw": -8.0 }
                    }
                ]
            }
        })
    }

    #[test]
    fn test_parse_statements_oldest_first() {
        let table = parse_statements(&summary_fixture());

        assert_eq!(table.period_count(), 2);
        assert_eq!(
            table.periods()[0],
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );

        let revenue = table.resolve("Total Revenue");
        assert!(revenue.present);
        assert_eq!(revenue.values, vec![100.0, 120.0]);
        assert_eq!(revenue.latest(), 120.0);
    }

    #[test]
    fn test_parse_statements_unreported_field_stays_absent() {
        let table = parse_statements(&summary_fixture());

        // ebitda is never reported in the fixture
        assert!(!table.contains("EBITDA"));
        let ebitda = table.resolve("EBITDA");
        assert!(!ebitda.present);
    }

    #[test]
    fn test_parse_statements_cashflow_rows() {
        let table = parse_statements(&summary_fixture());

        let ocf = table.resolve("Operating Cash Flow");
        assert!(ocf.present);
        assert_eq!(ocf.values, vec![35.0, 40.0]);

        let capex = table.resolve_containing("CapEx", &["Capital", "Expenditure"]);
        assert!(capex.present);
        assert_eq!(capex.values, vec![-8.0, -10.0]);
    }

    #[test]
    fn test_parse_statements_empty_result() {
        let table = parse_statements(&json!({}));
        assert_eq!(table.period_count(), 0);
        assert!(table.is_empty());
    }
}
