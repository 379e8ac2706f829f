//! Insight section generation with validation and abstention
//!
//! Each generated section moves through a small state machine: a draft is
//! validated against the formatting checks; a dirty draft gets exactly one
//! repair attempt; a still-dirty repair, a model failure, or empty inputs all
//! end in abstention. Abstention is a first-class outcome with fixed
//! per-section text, so the dashboard never renders a broken or fabricated
//! section.

use crate::prompts;
use crate::validate::{self, strip_code_fences};
use lens_llm::{CompletionRequestBuilder, Message, TextModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The generated sections of a dashboard, in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    NewsSummary,
    StrategicAnalysis,
    FinancialDeepDive,
    SegmentBreakdown,
    CoreDriver,
}

impl SectionKind {
    /// Render title
    pub fn title(self) -> &'static str {
        match self {
            Self::NewsSummary => "Recent News",
            Self::StrategicAnalysis => "Bull & Bear Case",
            Self::FinancialDeepDive => "Financial Drivers",
            Self::SegmentBreakdown => "Segment Breakdown",
            Self::CoreDriver => "Core Driver",
        }
    }

    /// Fixed text rendered when the section abstains
    pub fn abstention(self) -> &'static str {
        match self {
            Self::NewsSummary | Self::SegmentBreakdown => "No major events found.",
            Self::StrategicAnalysis => "No recent earnings analysis found to summarize.",
            Self::FinancialDeepDive => "No recent financial analysis found to summarize.",
            Self::CoreDriver => "N/A",
        }
    }

    /// Whether the section needs the reasoning model rather than the fast one
    pub fn needs_reasoning(self) -> bool {
        matches!(
            self,
            Self::StrategicAnalysis | Self::FinancialDeepDive | Self::SegmentBreakdown
        )
    }
}

/// Lifecycle of one generated section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// First draft produced, not yet validated
    Drafted,
    /// Draft failed validation, repair in flight
    Repairing,
    /// Final text passed validation
    Validated,
    /// Gave up; fixed abstention text is rendered instead
    Abstained,
}

/// A finished section ready to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSection {
    pub kind: SectionKind,
    /// Final text: validated model output or the abstention text
    pub text: String,
    /// True when the text came from the model rather than abstention
    pub grounded: bool,
}

impl InsightSection {
    /// A section that abstained
    pub fn abstained(kind: SectionKind) -> Self {
        Self {
            kind,
            text: kind.abstention().to_string(),
            grounded: false,
        }
    }
}

/// One retrieved item fed into a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub title: String,
    pub source: String,
    pub date: Option<String>,
    pub body: String,
}

/// A revenue-by-segment estimate extracted from coverage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEstimate {
    /// Segment name
    pub label: String,
    /// Revenue in billions of dollars
    pub value_billions: f64,
    /// Short year-over-year description
    #[serde(default)]
    pub growth: String,
}

/// Generates dashboard sections through a text model
pub struct InsightGenerator {
    model: Arc<dyn TextModel>,
    reasoning_model: String,
    fast_model: String,
    max_tokens: usize,
    temperature: f32,
}

impl InsightGenerator {
    /// Create a generator over the given model backend
    pub fn new(
        model: Arc<dyn TextModel>,
        reasoning_model: impl Into<String>,
        fast_model: impl Into<String>,
        max_tokens: usize,
        temperature: f32,
    ) -> Self {
        Self {
            model,
            reasoning_model: reasoning_model.into(),
            fast_model: fast_model.into(),
            max_tokens,
            temperature,
        }
    }

    fn model_for(&self, kind: SectionKind) -> &str {
        if kind.needs_reasoning() {
            &self.reasoning_model
        } else {
            &self.fast_model
        }
    }

    async fn complete(&self, model_id: &str, prompt: String) -> lens_llm::Result<String> {
        let request = CompletionRequestBuilder::new(model_id)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build();
        Ok(self.model.complete(request).await?.text)
    }

    /// Generate one section.
    ///
    /// Empty inputs abstain immediately with no model call. A draft that
    /// fails validation gets exactly one repair attempt; if the repair is
    /// still dirty, or the model errors at any point, the section abstains.
    pub async fn generate(
        &self,
        kind: SectionKind,
        ticker: &str,
        inputs: &[ContextItem],
    ) -> InsightSection {
        if inputs.is_empty() {
            debug!(ticker, section = ?kind, "no inputs, abstaining without model call");
            return InsightSection::abstained(kind);
        }

        let model_id = self.model_for(kind);
        let draft = match self
            .complete(model_id, prompts::section_prompt(kind, ticker, inputs))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(ticker, section = ?kind, %error, "draft failed, abstaining");
                return InsightSection::abstained(kind);
            }
        };

        let violations = validate::scan(&draft);
        let state = if violations.is_empty() {
            DraftState::Validated
        } else {
            debug!(ticker, section = ?kind, ?violations, "draft dirty, repairing");
            DraftState::Repairing
        };

        let text = if state == DraftState::Validated {
            draft
        } else {
            let repaired = match self
                .complete(model_id, prompts::repair_prompt(&draft, &violations))
                .await
            {
                Ok(text) => text,
                Err(error) => {
                    warn!(ticker, section = ?kind, %error, "repair failed, abstaining");
                    return InsightSection::abstained(kind);
                }
            };
            if !validate::is_clean(&repaired) {
                warn!(ticker, section = ?kind, "repair still dirty, abstaining");
                return InsightSection::abstained(kind);
            }
            repaired
        };

        InsightSection {
            kind,
            text,
            grounded: true,
        }
    }

    /// Identify direct competitors as validated ticker symbols.
    ///
    /// Returns an empty list on any failure; the competitors panel simply
    /// stays empty.
    pub async fn identify_competitors(&self, ticker: &str) -> Vec<String> {
        let text = match self
            .complete(&self.fast_model, prompts::competitors_prompt(ticker))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(ticker, %error, "competitor lookup failed");
                return Vec::new();
            }
        };

        let Ok(raw) = serde_json::from_str::<Vec<String>>(strip_code_fences(&text)) else {
            warn!(ticker, "competitor response unparseable");
            return Vec::new();
        };

        let mut competitors: Vec<String> = raw
            .into_iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| is_plausible_ticker(t) && t != ticker)
            .collect();
        competitors.truncate(4);
        competitors
    }

    /// Extract segment revenue estimates from coverage.
    ///
    /// Empty inputs or any failure return an empty list.
    pub async fn extract_segments(
        &self,
        ticker: &str,
        inputs: &[ContextItem],
    ) -> Vec<SegmentEstimate> {
        if inputs.is_empty() {
            return Vec::new();
        }

        let text = match self
            .complete(&self.reasoning_model, prompts::segments_prompt(ticker, inputs))
            .await
        {
            Ok(text) => text,
            Err(error) => {
                warn!(ticker, %error, "segment extraction failed");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<SegmentEstimate>>(strip_code_fences(&text)) {
            Ok(segments) => segments
                .into_iter()
                .filter(|s| !s.label.is_empty() && s.value_billions.is_finite())
                .collect(),
            Err(error) => {
                warn!(ticker, %error, "segment response unparseable");
                Vec::new()
            }
        }
    }
}

/// A plausible US ticker: 1-5 uppercase ASCII alphanumerics
fn is_plausible_ticker(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= 5
        && candidate.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_llm::{CompletionRequest, CompletionResponse, ModelError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Model that replays a queue of scripted responses
    struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TextModel for ScriptedModel {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> lens_llm::Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().await;
            match responses.pop() {
                Some(text) => Ok(CompletionResponse::from_text(text)),
                None => Err(ModelError::RequestFailed("script exhausted".to_string())),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn generator(model: Arc<ScriptedModel>) -> InsightGenerator {
        InsightGenerator::new(model, "pro", "flash", 2048, 0.2)
    }

    fn inputs() -> Vec<ContextItem> {
        vec![ContextItem {
            title: "Apple beats revenue estimates".to_string(),
            source: "wire".to_string(),
            date: Some("2025-06-01".to_string()),
            body: "Revenue of $95.4 billion.".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_clean_draft_validates_first_pass() {
        let model = Arc::new(ScriptedModel::new(vec![
            "Revenue grew 8 percent to $95.4 billion.",
        ]));
        let section = generator(Arc::clone(&model))
            .generate(SectionKind::NewsSummary, "AAPL", &inputs())
            .await;

        assert!(section.grounded);
        assert_eq!(section.text, "Revenue grew 8 percent to $95.4 billion.");
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_dirty_draft_repaired_once() {
        let model = Arc::new(ScriptedModel::new(vec![
            "Revenue was $95.4B$ this quarter.",
            "Revenue was $95.4 billion this quarter.",
        ]));
        let section = generator(Arc::clone(&model))
            .generate(SectionKind::NewsSummary, "AAPL", &inputs())
            .await;

        assert!(section.grounded);
        assert_eq!(section.text, "Revenue was $95.4 billion this quarter.");
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_dirty_repair_abstains() {
        let model = Arc::new(ScriptedModel::new(vec![
            "Revenue was $95.4B$ this quarter.",
            "Still broken: $95.4B$ again.",
        ]));
        let section = generator(Arc::clone(&model))
            .generate(SectionKind::NewsSummary, "AAPL", &inputs())
            .await;

        assert!(!section.grounded);
        assert_eq!(section.text, SectionKind::NewsSummary.abstention());
        // Exactly one repair attempt, never a second
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_inputs_abstain_without_model_call() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let section = generator(Arc::clone(&model))
            .generate(SectionKind::SegmentBreakdown, "AAPL", &[])
            .await;

        assert!(!section.grounded);
        assert_eq!(section.text, "No major events found.");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_error_abstains() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let section = generator(Arc::clone(&model))
            .generate(SectionKind::NewsSummary, "AAPL", &inputs())
            .await;

        assert!(!section.grounded);
        assert_eq!(section.text, SectionKind::NewsSummary.abstention());
    }

    #[tokio::test]
    async fn test_identify_competitors_validates_tickers() {
        let model = Arc::new(ScriptedModel::new(vec![
            "```json\n[\"MSFT\", \"googl\", \"not a ticker\", \"AAPL\", \"AMZN\", \"META\", \"NVDA\"]\n```",
        ]));
        let competitors = generator(model).identify_competitors("AAPL").await;

        // lowercase normalized, junk and the ticker itself dropped, capped at 4
        assert_eq!(competitors, vec!["MSFT", "GOOGL", "AMZN", "META"]);
    }

    #[tokio::test]
    async fn test_extract_segments() {
        let model = Arc::new(ScriptedModel::new(vec![
            "[{\"label\": \"iPhone\", \"value_billions\": 46.2, \"growth\": \"+3% YoY\"}, \
             {\"label\": \"\", \"value_billions\": 1.0, \"growth\": \"\"}]",
        ]));
        let segments = generator(model).extract_segments("AAPL", &inputs()).await;

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, "iPhone");
        assert!((segments[0].value_billions - 46.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_extract_segments_empty_inputs_no_call() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let segments = generator(Arc::clone(&model)).extract_segments("AAPL", &[]).await;

        assert!(segments.is_empty());
        assert_eq!(model.call_count(), 0);
    }
}
