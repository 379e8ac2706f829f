//! Single-ticker dashboard pipeline
//!
//! This crate turns raw market feeds and news coverage into one rendered
//! dashboard per ticker. It covers:
//!
//! - Quarterly statement normalization with an explicit missing-value policy
//! - Quarter-over-quarter and year-over-year growth series
//! - Freshness-filtered, deduplicated news retrieval
//! - Company identity resolution for relevance filtering
//! - Validated, abstention-capable insight generation through a text model
//! - Momentum signals (RSI, moving averages) over daily price history
//! - Session state scoped to one ticker, fully invalidated on a switch
//!
//! # Example
//!
//! ```rust,ignore
//! use lens_dashboard::{DashboardConfig, DashboardEngine, SessionState};
//! use lens_dashboard::api::{GammaMarketsProvider, HttpNewsProvider, YahooMarketData};
//! use lens_llm::providers::GeminiProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DashboardConfig::default();
//!     let model = Arc::new(GeminiProvider::from_env()?);
//!     let market = Arc::new(YahooMarketData::new(config.request_timeout)?);
//!     let news = Arc::new(HttpNewsProvider::new(&config.news_endpoint, config.request_timeout)?);
//!     let markets = Arc::new(GammaMarketsProvider::new(
//!         &config.markets_endpoint,
//!         config.request_timeout,
//!     )?);
//!
//!     let engine = DashboardEngine::new(config, model, market, news, markets);
//!     let mut session = SessionState::new(engine.config().payload_cache_ttl);
//!
//!     let report = engine.render(&mut session, "AAPL").await;
//!     println!("{} sections", report.insight_sections.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod growth;
pub mod identity;
pub mod insight;
pub mod normalize;
pub mod prompts;
pub mod retrieve;
pub mod session;
pub mod signals;
pub mod statements;
pub mod validate;

// Re-export main types for convenience
pub use config::DashboardConfig;
pub use engine::{DashboardEngine, DashboardReport, MetricSection};
pub use error::{DashboardError, Result};
pub use growth::{GrowthRecord, compute_growth};
pub use identity::{AliasResolver, TickerIdentity};
pub use insight::{InsightGenerator, InsightSection, SectionKind, SegmentEstimate};
pub use retrieve::{FreshnessRetriever, RecencyWindow, RelevanceFilterable};
pub use session::SessionState;
pub use signals::{MomentumSignals, Signal};
pub use statements::{NormalizedMetric, PLACEHOLDER_TEXT, StatementTable};
