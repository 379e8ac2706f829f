//! Prediction-market provider

use crate::error::{DashboardError, Result};
use crate::retrieve::RelevanceFilterable;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A prediction market with a free-text question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketItem {
    /// Market question, e.g. "Will AAPL beat Q3 revenue estimates?"
    pub title: String,
    /// Market URL
    pub url: String,
    /// Traded volume in USD
    pub volume: f64,
    /// Current YES price in [0, 1]
    pub yes_odds: f64,
    /// Market resolution date
    pub end_date: Option<DateTime<Utc>>,
}

impl RelevanceFilterable for MarketItem {
    fn searchable_text(&self) -> String {
        self.title.clone()
    }

    fn identity_key(&self) -> String {
        if self.url.is_empty() {
            self.title.clone()
        } else {
            self.url.clone()
        }
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }
}

/// Provider of prediction markets matching a free-text query
#[async_trait]
pub trait PredictionMarketProvider: Send + Sync {
    /// Search open markets matching the query
    async fn search(&self, query: &str) -> Result<Vec<MarketItem>>;
}

/// Polymarket gamma-style HTTP client
pub struct GammaMarketsProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl GammaMarketsProvider {
    /// Create a new provider against the given markets endpoint
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DashboardError::NetworkError)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PredictionMarketProvider for GammaMarketsProvider {
    async fn search(&self, query: &str) -> Result<Vec<MarketItem>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("active", "true"),
                ("closed", "false"),
                ("limit", "50"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::UpstreamUnavailable {
                source: "prediction-markets".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let markets: Vec<RawMarket> = response.json().await?;
        Ok(markets.into_iter().map(RawMarket::into_item).collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMarket {
    #[serde(default)]
    question: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    volume: serde_json::Value,
    /// JSON-encoded array of outcome prices, YES first
    #[serde(default)]
    outcome_prices: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl RawMarket {
    fn into_item(self) -> MarketItem {
        let yes_odds = self
            .outcome_prices
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .and_then(|prices| prices.first().and_then(|p| p.parse::<f64>().ok()))
            .unwrap_or(0.0);

        let end_date = self
            .end_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        let url = if self.slug.is_empty() {
            String::new()
        } else {
            format!("https://polymarket.com/event/{}", self.slug)
        };

        MarketItem {
            title: self.question,
            url,
            volume: crate::normalize::coerce(&self.volume),
            yes_odds,
            end_date,
        }
    }
}
