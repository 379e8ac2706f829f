//! Freshness-filtered retrieval over external search providers
//!
//! Every outbound search carries a mandatory recency window; the window is a
//! required argument, so a window-less query does not compile. Results are
//! deduplicated by a stable identity key and capped before they reach any
//! prompt.

use crate::api::news::{NewsItem, NewsProvider};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Backward-looking recency bound for searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyWindow {
    /// Past 30 days
    PastMonth,
    /// Past 90 days
    PastQuarter,
    /// Past 365 days
    PastYear,
}

impl RecencyWindow {
    /// Window length in days
    pub fn days(self) -> i64 {
        match self {
            Self::PastMonth => 30,
            Self::PastQuarter => 90,
            Self::PastYear => 365,
        }
    }

    /// Oldest acceptable timestamp relative to `now`
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    /// Provider-side time-limit code
    pub fn code(self) -> &'static str {
        match self {
            Self::PastMonth => "m",
            Self::PastQuarter => "3m",
            Self::PastYear => "y",
        }
    }
}

/// Forward horizon for scheduled-event searches: next 90 days
pub const FORWARD_HORIZON_DAYS: i64 = 90;

/// A fetched record that can be deduplicated and relevance-filtered
pub trait RelevanceFilterable {
    /// Free text to match identifiers against (title plus any snippet)
    fn searchable_text(&self) -> String;

    /// Stable identity key for deduplication (URL, else title+date)
    fn identity_key(&self) -> String;

    /// Timestamp used for freshness filtering, when the record has one
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// Drop items dated outside the window. Undated items are kept: staleness
/// cannot be proven for them, and dropping them would silence providers
/// that omit timestamps entirely.
pub fn filter_window<T: RelevanceFilterable>(
    items: Vec<T>,
    window: RecencyWindow,
    now: DateTime<Utc>,
) -> Vec<T> {
    let cutoff = window.cutoff(now);
    items
        .into_iter()
        .filter(|item| match item.timestamp() {
            Some(ts) => ts >= cutoff && ts <= now,
            None => true,
        })
        .collect()
}

/// Keep items dated inside the forward horizon (or undated)
pub fn filter_upcoming<T: RelevanceFilterable>(items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
    let horizon = now + Duration::days(FORWARD_HORIZON_DAYS);
    items
        .into_iter()
        .filter(|item| match item.timestamp() {
            Some(ts) => ts >= now && ts <= horizon,
            None => true,
        })
        .collect()
}

/// Deduplicate by identity key, keeping first occurrence order
pub fn dedup<T: RelevanceFilterable>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity_key()))
        .collect()
}

/// Retriever wrapping a news provider with the freshness discipline
pub struct FreshnessRetriever {
    provider: Arc<dyn NewsProvider>,
    cap: usize,
}

impl FreshnessRetriever {
    /// Create a retriever with the given result cap
    pub fn new(provider: Arc<dyn NewsProvider>, cap: usize) -> Self {
        Self { provider, cap }
    }

    /// Fetch recent items for a query within a mandatory window.
    ///
    /// Results are window-filtered, deduplicated, and capped.
    pub async fn fetch_recent(&self, query: &str, window: RecencyWindow) -> Result<Vec<NewsItem>> {
        let raw = self.provider.search(query, window).await?;
        let fetched = raw.len();

        let mut items = dedup(filter_window(raw, window, Utc::now()));
        items.truncate(self.cap);

        debug!(
            query,
            fetched,
            kept = items.len(),
            window = ?window,
            "retrieved recent items"
        );
        Ok(items)
    }

    /// Fetch upcoming scheduled-event items within the forward horizon
    pub async fn fetch_upcoming(&self, query: &str) -> Result<Vec<NewsItem>> {
        let raw = self.provider.search_upcoming(query).await?;

        let mut items = dedup(filter_upcoming(raw, Utc::now()));
        items.truncate(self.cap);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        News {}

        #[async_trait]
        impl NewsProvider for News {
            async fn search(&self, query: &str, window: RecencyWindow) -> Result<Vec<NewsItem>>;
            async fn search_upcoming(&self, query: &str) -> Result<Vec<NewsItem>>;
        }
    }

    fn item(title: &str, url: &str, days_ago: i64) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            url: url.to_string(),
            source: "wire".to_string(),
            published: Some(Utc::now() - Duration::days(days_ago)),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_window_days() {
        assert_eq!(RecencyWindow::PastMonth.days(), 30);
        assert_eq!(RecencyWindow::PastQuarter.days(), 90);
        assert_eq!(RecencyWindow::PastYear.days(), 365);
    }

    #[test]
    fn test_filter_window_drops_stale() {
        let items = vec![item("fresh", "https://a", 10), item("stale", "https://b", 400)];
        let kept = filter_window(items, RecencyWindow::PastYear, Utc::now());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "fresh");
    }

    #[test]
    fn test_filter_window_keeps_undated() {
        let mut undated = item("undated", "https://c", 0);
        undated.published = None;
        let kept = filter_window(vec![undated], RecencyWindow::PastMonth, Utc::now());
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_dedup_by_url() {
        let items = vec![
            item("first", "https://same", 1),
            item("second", "https://same", 2),
            item("third", "https://other", 3),
        ];
        let kept = dedup(items);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "first");
    }

    #[tokio::test]
    async fn test_fetch_recent_caps_results() {
        let mut provider = MockNews::new();
        provider.expect_search().returning(|_, _| {
            Ok((0..20)
                .map(|i| item(&format!("t{i}"), &format!("https://n/{i}"), 1))
                .collect())
        });

        let retriever = FreshnessRetriever::new(Arc::new(provider), 10);
        let items = retriever
            .fetch_recent("AAPL stock", RecencyWindow::PastQuarter)
            .await
            .unwrap();

        assert_eq!(items.len(), 10);
    }

    #[tokio::test]
    async fn test_fetch_recent_window_enforced() {
        let mut provider = MockNews::new();
        provider.expect_search().returning(|_, _| {
            Ok(vec![item("old", "https://old", 400), item("new", "https://new", 5)])
        });

        let retriever = FreshnessRetriever::new(Arc::new(provider), 10);
        let items = retriever
            .fetch_recent("AAPL stock", RecencyWindow::PastYear)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "new");
    }

    #[tokio::test]
    async fn test_fetch_upcoming_horizon() {
        let mut provider = MockNews::new();
        provider.expect_search_upcoming().returning(|_| {
            Ok(vec![
                item("next month", "https://u1", -20),
                item("next year", "https://u2", -300),
                item("last week", "https://u3", 7),
            ])
        });

        let retriever = FreshnessRetriever::new(Arc::new(provider), 10);
        let items = retriever.fetch_upcoming("AAPL earnings date").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "next month");
    }
}
