//! News search provider

use crate::error::{DashboardError, Result};
use crate::retrieve::{RecencyWindow, RelevanceFilterable};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A news article returned by the search provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline
    pub title: String,
    /// Article URL
    pub url: String,
    /// Publishing outlet
    pub source: String,
    /// Publication timestamp, when the provider supplies one
    pub published: Option<DateTime<Utc>>,
    /// Short body snippet
    pub snippet: String,
}

impl RelevanceFilterable for NewsItem {
    fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }

    fn identity_key(&self) -> String {
        if self.url.is_empty() {
            let date = self
                .published
                .map(|d| d.date_naive().to_string())
                .unwrap_or_default();
            format!("{}|{date}", self.title)
        } else {
            self.url.clone()
        }
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.published
    }
}

/// Provider of news search results
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Search recent news for a query within a recency window
    async fn search(&self, query: &str, window: RecencyWindow) -> Result<Vec<NewsItem>>;

    /// Search for upcoming scheduled events matching a query
    async fn search_upcoming(&self, query: &str) -> Result<Vec<NewsItem>>;
}

/// HTTP JSON news search client
pub struct HttpNewsProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNewsProvider {
    /// Create a new provider against the given search endpoint
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

    async fn query(&self, keywords: &str, timelimit: Option<&str>) -> Result<Vec<NewsItem>> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("q", keywords),
            ("region", "us-en"),
            ("max_results", "20"),
        ]);
        if let Some(code) = timelimit {
            request = request.query(&[("timelimit", code)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(DashboardError::UpstreamUnavailable {
                source: "news".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().map(RawArticle::into_item).collect())
    }
}

#[async_trait]
impl NewsProvider for HttpNewsProvider {
    async fn search(&self, query: &str, window: RecencyWindow) -> Result<Vec<NewsItem>> {
        self.query(query, Some(window.code())).await
    }

    async fn search_upcoming(&self, query: &str) -> Result<Vec<NewsItem>> {
        // Forward-looking events are announced in recent coverage; the
        // retriever applies the forward-horizon date filter afterwards.
        self.query(query, Some(RecencyWindow::PastMonth.code())).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    body: String,
}

impl RawArticle {
    fn into_item(self) -> NewsItem {
        let published = self
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        NewsItem {
            title: self.title,
            url: self.url,
            source: self.source,
            published,
            snippet: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_prefers_url() {
        let item = NewsItem {
            title: "Apple beats estimates".to_string(),
            url: "https://example.com/a".to_string(),
            source: "wire".to_string(),
            published: None,
            snippet: String::new(),
        };
        assert_eq!(item.identity_key(), "https://example.com/a");
    }

    #[test]
    fn test_identity_key_falls_back_to_title_date() {
        let item = NewsItem {
            title: "Apple beats estimates".to_string(),
            url: String::new(),
            source: "wire".to_string(),
            published: Some("2025-05-01T00:00:00Z".parse().unwrap()),
            snippet: String::new(),
        };
        assert_eq!(item.identity_key(), "Apple beats estimates|2025-05-01");
    }

    #[test]
    fn test_raw_article_date_parsing() {
        let raw = RawArticle {
            title: "t".to_string(),
            url: "u".to_string(),
            source: "s".to_string(),
            date: Some("2025-06-15T12:00:00Z".to_string()),
            body: "b".to_string(),
        };
        let item = raw.into_item();
        assert!(item.published.is_some());

        let bad = RawArticle {
            title: "t".to_string(),
            url: "u".to_string(),
            source: "s".to_string(),
            date: Some("yesterday".to_string()),
            body: "b".to_string(),
        };
        assert!(bad.into_item().published.is_none());
    }
}
