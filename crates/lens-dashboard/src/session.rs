//! Per-session state scoped to a single ticker
//!
//! All derived state hangs off the active ticker, including a TTL store of
//! raw upstream payloads. Switching tickers replaces the whole lot at once,
//! and every write is guarded by an admission check so a fetch that was
//! still in flight when the switch happened cannot land its stale result in
//! the new ticker's view.

use crate::growth::GrowthRecord;
use crate::identity::TickerIdentity;
use crate::insight::InsightSection;
use crate::statements::NormalizedMetric;
use cached::{Cached, TimedCache};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Identifies one cached upstream payload within the active ticker's
/// session. The ticker is deliberately not part of the key: a ticker switch
/// clears the whole store, so an entry can never be served under a ticker
/// it was not fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadKey {
    endpoint: String,
    params: String,
}

impl PayloadKey {
    /// Key for `endpoint` with serializable query parameters
    pub fn new(endpoint: impl Into<String>, params: impl Serialize) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }
}

/// Shared handle to the session's payload store.
///
/// Clones refer to the same store, so a handle taken before a batch of
/// concurrent fetches still observes an invalidation that lands mid-flight.
/// Entries also age out on the session's TTL.
#[derive(Clone)]
pub struct PayloadCache {
    entries: Arc<RwLock<TimedCache<PayloadKey, Value>>>,
}

impl PayloadCache {
    fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Return the live payload for `key`, or run `fetch` and retain its result
    pub async fn fetch_or<F, Fut, E>(&self, key: PayloadKey, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.entries.write().await.cache_get(&key) {
            debug!(endpoint = %key.endpoint, "payload served from session cache");
            return Ok(value.clone());
        }

        let value = fetch().await?;
        let _ = self.entries.write().await.cache_set(key, value.clone());
        Ok(value)
    }

    async fn clear(&self) {
        self.entries.write().await.cache_clear();
    }
}

/// State for one dashboard session
pub struct SessionState {
    ticker: Option<String>,
    metrics: HashMap<String, NormalizedMetric>,
    growth: HashMap<String, Vec<GrowthRecord>>,
    identity: Option<TickerIdentity>,
    sections: Vec<InsightSection>,
    payloads: PayloadCache,
    payload_ttl: Duration,
}

impl SessionState {
    /// Create a fresh session with the given payload-cache TTL
    pub fn new(payload_ttl: Duration) -> Self {
        Self {
            ticker: None,
            metrics: HashMap::new(),
            growth: HashMap::new(),
            identity: None,
            sections: Vec::new(),
            payloads: PayloadCache::with_ttl(payload_ttl),
            payload_ttl,
        }
    }

    /// The session's active ticker
    pub fn current_ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    /// Payload store scoped to the active ticker
    pub fn payloads(&self) -> &PayloadCache {
        &self.payloads
    }

    /// Stored metric series by name
    pub fn metric(&self, name: &str) -> Option<&NormalizedMetric> {
        self.metrics.get(name)
    }

    /// Stored growth series by metric name
    pub fn growth(&self, name: &str) -> Option<&[GrowthRecord]> {
        self.growth.get(name).map(Vec::as_slice)
    }

    /// Resolved identity for the active ticker
    pub fn identity(&self) -> Option<&TickerIdentity> {
        self.identity.as_ref()
    }

    /// Generated sections for the active ticker
    pub fn sections(&self) -> &[InsightSection] {
        &self.sections
    }

    /// Switch the session to `ticker` if it differs from the active one.
    ///
    /// A switch replaces every piece of derived state and clears the payload
    /// store. Returns true when a switch happened.
    pub async fn invalidate_if_changed(&mut self, ticker: &str) -> bool {
        if self.ticker.as_deref() == Some(ticker) {
            return false;
        }

        debug!(from = ?self.ticker, to = ticker, "ticker changed, invalidating session");
        self.ticker = Some(ticker.to_string());
        self.metrics = HashMap::new();
        self.growth = HashMap::new();
        self.identity = None;
        self.sections = Vec::new();
        self.payloads.clear().await;
        true
    }

    /// Whether a result computed for `ticker` may still be stored
    pub fn admit(&self, ticker: &str) -> bool {
        self.ticker.as_deref() == Some(ticker)
    }

    /// Store a metric series; dropped when `ticker` is no longer active
    pub fn store_metric(&mut self, ticker: &str, metric: NormalizedMetric) -> bool {
        if !self.admit(ticker) {
            debug!(ticker, metric = %metric.name, "dropping stale metric");
            return false;
        }
        self.metrics.insert(metric.name.clone(), metric);
        true
    }

    /// Store a growth series; dropped when `ticker` is no longer active
    pub fn store_growth(&mut self, ticker: &str, name: &str, records: Vec<GrowthRecord>) -> bool {
        if !self.admit(ticker) {
            return false;
        }
        self.growth.insert(name.to_string(), records);
        true
    }

    /// Store the resolved identity; dropped when `ticker` is no longer active
    pub fn set_identity(&mut self, ticker: &str, identity: TickerIdentity) -> bool {
        if !self.admit(ticker) {
            return false;
        }
        self.identity = Some(identity);
        true
    }

    /// Append a generated section; dropped when `ticker` is no longer active
    pub fn push_section(&mut self, ticker: &str, section: InsightSection) -> bool {
        if !self.admit(ticker) {
            debug!(ticker, "dropping stale section");
            return false;
        }
        self.sections.push(section);
        true
    }

    /// Payload-cache TTL this session was configured with
    pub fn payload_ttl(&self) -> Duration {
        self.payload_ttl
    }
}
