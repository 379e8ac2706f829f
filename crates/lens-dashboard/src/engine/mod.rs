//! Dashboard rendering engine
//!
//! Coordinates provider fetches, metric normalization, identity filtering,
//! and insight generation into one [`DashboardReport`]. Rendering never
//! fails as a whole: each failed fetch empties only its own section of the
//! report.

pub mod report;

pub use report::{DashboardReport, MetricSection};

use crate::api::market::MarketDataProvider;
use crate::api::markets::PredictionMarketProvider;
use crate::api::news::{NewsItem, NewsProvider};
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::growth::compute_growth;
use crate::identity::{AliasResolver, TickerIdentity};
use crate::insight::{ContextItem, InsightGenerator, SectionKind};
use crate::retrieve::{
    FreshnessRetriever, RecencyWindow, RelevanceFilterable, dedup, filter_upcoming,
};
use crate::session::{PayloadKey, SessionState};
use crate::signals;
use crate::statements::StatementTable;
use chrono::Utc;
use lens_llm::TextModel;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Days of price history fetched for momentum signals
const HISTORY_DAYS: i64 = 365;

/// Metric fallback chains, in statement order. Each entry resolves to the
/// first name present in the table and keeps the first name as its label.
const METRIC_CHAINS: &[&[&str]] = &[
    &["Total Revenue"],
    &["Gross Profit"],
    &["EBITDA", "Normalized EBITDA", "Operating Income"],
    &["Net Income"],
    &["Operating Cash Flow", "Total Cash From Operating Activities"],
];

/// Coordinates one ticker's data and insight pipeline
pub struct DashboardEngine {
    config: DashboardConfig,
    market: Arc<dyn MarketDataProvider>,
    news: FreshnessRetriever,
    markets: Arc<dyn PredictionMarketProvider>,
    generator: InsightGenerator,
    resolver: AliasResolver,
}

impl DashboardEngine {
    /// Assemble an engine from its providers and a model backend
    pub fn new(
        config: DashboardConfig,
        model: Arc<dyn TextModel>,
        market: Arc<dyn MarketDataProvider>,
        news_provider: Arc<dyn NewsProvider>,
        markets: Arc<dyn PredictionMarketProvider>,
    ) -> Self {
        let news = FreshnessRetriever::new(news_provider, config.retrieval_cap);
        let generator = InsightGenerator::new(
            Arc::clone(&model),
            config.reasoning_model.clone(),
            config.fast_model.clone(),
            config.max_tokens,
            config.temperature,
        );
        let resolver = AliasResolver::new(model, config.fast_model.clone());

        Self {
            config,
            market,
            news,
            markets,
            generator,
            resolver,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Render a full dashboard for `ticker`, updating the session.
    ///
    /// Switching tickers wipes the session before any new state lands, and
    /// results computed for a previous ticker are never admitted.
    #[instrument(skip(self, session))]
    pub async fn render(&self, session: &mut SessionState, ticker: &str) -> DashboardReport {
        let ticker = ticker.trim().to_uppercase();
        session.invalidate_if_changed(&ticker).await;

        // Statements go through the session's payload cache so a repeated
        // render of the same ticker within the TTL skips the upstream call.
        let payloads = session.payloads().clone();
        let statements_fut = async {
            let key = PayloadKey::new("statements", serde_json::json!({}));
            let value = payloads
                .fetch_or(key, || async {
                    let table = self.market.quarterly_statements(&ticker).await?;
                    serde_json::to_value(table).map_err(DashboardError::from)
                })
                .await?;
            serde_json::from_value::<StatementTable>(value).map_err(DashboardError::from)
        };

        let general_query = format!("{ticker} stock");
        let earnings_query = format!("{ticker} earnings analysis bull bear thesis");
        let financial_query = format!("{ticker} financial results analysis revenue profit drivers");
        let segment_query = format!("{ticker} revenue breakdown by segment earnings report");
        let (statements, snapshot, history, identity, general, earnings, financial, segment_news, markets) = tokio::join!(
            statements_fut,
            self.market.snapshot(&ticker),
            self.market.price_history(&ticker, HISTORY_DAYS),
            self.resolver.resolve_identity(&ticker),
            self.news
                .fetch_recent(&general_query, RecencyWindow::PastMonth),
            self.news.fetch_recent(
                &earnings_query,
                RecencyWindow::PastQuarter,
            ),
            self.news.fetch_recent(
                &financial_query,
                RecencyWindow::PastQuarter,
            ),
            self.news.fetch_recent(
                &segment_query,
                RecencyWindow::PastQuarter,
            ),
            self.markets.search(&ticker),
        );

        let statements = statements.unwrap_or_else(|error| {
            warn!(%ticker, %error, "statement fetch failed");
            StatementTable::default()
        });
        let snapshot = snapshot
            .map_err(|error| warn!(%ticker, %error, "snapshot fetch failed"))
            .ok();
        let momentum = history
            .map_err(|error| warn!(%ticker, %error, "price history fetch failed"))
            .ok()
            .map(|bars| signals::momentum(&bars));

        session.set_identity(&ticker, identity.clone());

        let general = filter_relevant(fetched(general, "general news"), &identity);
        let earnings = filter_relevant(fetched(earnings, "earnings news"), &identity);
        let financial = filter_relevant(fetched(financial, "financial news"), &identity);
        let segment_news = filter_relevant(fetched(segment_news, "segment news"), &identity);

        // Prediction markets get the same retrieval discipline as news:
        // forward horizon, dedup, cap, then relevance.
        let mut markets = dedup(filter_upcoming(
            fetched(markets, "prediction markets"),
            Utc::now(),
        ));
        markets.truncate(self.config.retrieval_cap);
        let markets = filter_relevant(markets, &identity);

        let mut metric_sections = Vec::with_capacity(METRIC_CHAINS.len() + 1);
        for chain in METRIC_CHAINS {
            let metric = statements.resolve_first(chain);
            let growth = compute_growth(&metric);
            session.store_growth(&ticker, &metric.name, growth.clone());
            session.store_metric(&ticker, metric.clone());
            metric_sections.push(MetricSection::new(&metric, growth));
        }
        let capex = statements.resolve_containing("Capital Expenditure", &["Capital", "Expenditure"]);
        let capex_growth = compute_growth(&capex);
        session.store_growth(&ticker, &capex.name, capex_growth.clone());
        session.store_metric(&ticker, capex.clone());
        metric_sections.push(MetricSection::new(&capex, capex_growth));

        let mut insight_sections = Vec::new();
        for (kind, items) in [
            (SectionKind::NewsSummary, &general),
            (SectionKind::StrategicAnalysis, &earnings),
            (SectionKind::FinancialDeepDive, &financial),
            (SectionKind::SegmentBreakdown, &segment_news),
            (SectionKind::CoreDriver, &general),
        ] {
            let context = news_context(items);
            let section = self.generator.generate(kind, &ticker, &context).await;
            session.push_section(&ticker, section.clone());
            insight_sections.push(section);
        }

        let competitors = self.generator.identify_competitors(&ticker).await;
        let segments = self
            .generator
            .extract_segments(&ticker, &news_context(&segment_news))
            .await;

        DashboardReport {
            ticker,
            generated_at: Utc::now(),
            snapshot,
            periods: statements.periods().to_vec(),
            signals: momentum,
            metric_sections,
            insight_sections,
            markets,
            competitors,
            segments,
        }
    }
}

/// Unwrap a fetch result, logging and emptying on failure
fn fetched<T>(result: crate::error::Result<Vec<T>>, source: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(error) => {
            warn!(%error, source, "fetch failed, section degrades to empty");
            Vec::new()
        }
    }
}

/// Keep only items the identity recognizes as being about the company
fn filter_relevant<T: RelevanceFilterable>(items: Vec<T>, identity: &TickerIdentity) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| identity.matches(&item.searchable_text()))
        .collect()
}

fn news_context(items: &[NewsItem]) -> Vec<ContextItem> {
    items
        .iter()
        .map(|item| ContextItem {
            title: item.title.clone(),
            source: item.source.clone(),
            date: item.published.map(|d| d.date_naive().to_string()),
            body: item.snippet.clone(),
        })
        .collect()
}
