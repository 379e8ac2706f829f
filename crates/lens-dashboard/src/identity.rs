//! Ticker identity resolution for relevance filtering
//!
//! Search results for a ticker routinely include coverage of unrelated
//! companies. A resolved [`TickerIdentity`] supplies the vocabulary (sibling
//! tickers, company names, products) used to decide whether a headline is
//! actually about the company. Resolution itself never fails: any model or
//! parse failure degrades to a permissive partial identity that filters
//! nothing out.

use crate::prompts;
use crate::validate::strip_code_fences;
use lens_llm::{CompletionRequestBuilder, Message, TextModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity vocabulary for one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerIdentity {
    /// The ticker this identity was resolved for
    pub ticker: String,
    /// Other tickers for the same company (e.g. GOOG / GOOGL)
    #[serde(default)]
    pub sibling_tickers: Vec<String>,
    /// Official company name
    #[serde(default)]
    pub company_name: Option<String>,
    /// Names the press uses for the company
    #[serde(default)]
    pub colloquial_names: Vec<String>,
    /// Flagship product and brand names
    #[serde(default)]
    pub products: Vec<String>,
    /// True when resolution failed and only the ticker itself is known.
    /// Partial identities must not be used to exclude items.
    #[serde(default)]
    pub partial: bool,
}

impl TickerIdentity {
    /// Permissive identity used when resolution fails
    pub fn fallback(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            sibling_tickers: Vec::new(),
            company_name: None,
            colloquial_names: Vec::new(),
            products: Vec::new(),
            partial: true,
        }
    }

    /// All identity keywords, ticker first
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords = vec![self.ticker.as_str()];
        keywords.extend(self.sibling_tickers.iter().map(String::as_str));
        if let Some(name) = &self.company_name {
            keywords.push(name.as_str());
        }
        keywords.extend(self.colloquial_names.iter().map(String::as_str));
        keywords.extend(self.products.iter().map(String::as_str));
        keywords.retain(|k| !k.is_empty());
        keywords
    }

    /// Whether the text mentions this company.
    ///
    /// A partial identity always matches: when only the ticker is known,
    /// excluding items risks dropping relevant coverage that names the
    /// company without the symbol.
    pub fn matches(&self, text: &str) -> bool {
        if self.partial {
            return true;
        }
        let lowered = text.to_lowercase();
        self.keywords()
            .iter()
            .any(|keyword| contains_word(&lowered, &keyword.to_lowercase()))
    }
}

/// Whole-word, case-insensitive containment check. Both inputs lowercase.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let at = start + pos;
        let end = at + needle.len();
        let before_ok = at == 0
            || !haystack[..at]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
        let after_ok = end == haystack.len()
            || !haystack[end..].chars().next().is_some_and(char::is_alphanumeric);
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

/// Resolves ticker identities through a text model
pub struct AliasResolver {
    model: Arc<dyn TextModel>,
    model_id: String,
}

impl AliasResolver {
    /// Create a resolver using the given model id
    pub fn new(model: Arc<dyn TextModel>, model_id: impl Into<String>) -> Self {
        Self {
            model,
            model_id: model_id.into(),
        }
    }

    /// Resolve the identity for a ticker, falling back on any failure
    pub async fn resolve_identity(&self, ticker: &str) -> TickerIdentity {
        let request = CompletionRequestBuilder::new(&self.model_id)
            .add_message(Message::user(prompts::identity_prompt(ticker)))
            .temperature(0.0)
            .max_tokens(512)
            .build();

        let response = match self.model.complete(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(ticker, %error, "identity resolution failed, using fallback");
                return TickerIdentity::fallback(ticker);
            }
        };

        match serde_json::from_str::<TickerIdentity>(strip_code_fences(&response.text)) {
            Ok(mut identity) => {
                identity.ticker = ticker.to_string();
                identity.partial = false;
                debug!(ticker, keywords = identity.keywords().len(), "resolved identity");
                identity
            }
            Err(error) => {
                warn!(ticker, %error, "identity response unparseable, using fallback");
                TickerIdentity::fallback(ticker)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_llm::{CompletionRequest, CompletionResponse, ModelError};

    fn full_identity() -> TickerIdentity {
        TickerIdentity {
            ticker: "GOOG".to_string(),
            sibling_tickers: vec!["GOOGL".to_string()],
            company_name: Some("Alphabet".to_string()),
            colloquial_names: vec!["Google".to_string()],
            products: vec!["YouTube".to_string(), "Android".to_string()],
            partial: false,
        }
    }

    #[test]
    fn test_matches_any_keyword() {
        let identity = full_identity();
        assert!(identity.matches("GOOGL shares rallied after hours"));
        assert!(identity.matches("YouTube ad revenue beat expectations"));
        assert!(identity.matches("alphabet posts record quarter"));
    }

    #[test]
    fn test_excludes_unrelated_company() {
        let identity = full_identity();
        assert!(!identity.matches("NVDA data center revenue doubles"));
    }

    #[test]
    fn test_whole_word_boundaries() {
        let identity = full_identity();
        // "GOOG" inside a longer token is not a mention
        assert!(!identity.matches("the googological series diverges"));
    }

    #[test]
    fn test_partial_identity_matches_everything() {
        let identity = TickerIdentity::fallback("AAPL");
        assert!(identity.matches("completely unrelated headline"));
    }

    struct FixedModel {
        text: String,
    }

    #[async_trait::async_trait]
    impl TextModel for FixedModel {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> lens_llm::Result<CompletionResponse> {
            Ok(CompletionResponse::from_text(self.text.clone()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingModel;

    #[async_trait::async_trait]
    impl TextModel for FailingModel {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> lens_llm::Result<CompletionResponse> {
            Err(ModelError::RequestFailed("boom".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_resolve_parses_fenced_json() {
        let model = FixedModel {
            text: "```json\n{\"ticker\": \"GOOG\", \"sibling_tickers\": [\"GOOGL\"], \
                   \"company_name\": \"Alphabet\", \"colloquial_names\": [\"Google\"], \
                   \"products\": [\"YouTube\"]}\n```"
                .to_string(),
        };
        let resolver = AliasResolver::new(Arc::new(model), "fast");

        let identity = resolver.resolve_identity("GOOG").await;
        assert!(!identity.partial);
        assert_eq!(identity.sibling_tickers, vec!["GOOGL"]);
        assert_eq!(identity.company_name.as_deref(), Some("Alphabet"));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_model_error() {
        let resolver = AliasResolver::new(Arc::new(FailingModel), "fast");
        let identity = resolver.resolve_identity("AAPL").await;

        assert!(identity.partial);
        assert_eq!(identity.ticker, "AAPL");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_bad_json() {
        let model = FixedModel {
            text: "Sure! Here is the company info you asked for.".to_string(),
        };
        let resolver = AliasResolver::new(Arc::new(model), "fast");
        let identity = resolver.resolve_identity("AAPL").await;

        assert!(identity.partial);
    }
}
