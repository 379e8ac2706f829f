//! Prompt templates for dashboard insight generation
//!
//! Every generation call shares [`BASE_INSTRUCTIONS`]; each section then gets
//! its own task prompt built over the retrieved context. Prompts that expect
//! JSON back say so explicitly and forbid prose around it.

use crate::insight::{ContextItem, SectionKind};
use crate::validate::Violation;
use std::fmt::Write;

/// Formatting and grounding rules prepended to every generation call
pub const BASE_INSTRUCTIONS: &str = "\
You are a financial analyst writing short dashboard sections for a plain-text terminal.

Formatting rules, all mandatory:
- Plain text only. Never use LaTeX or any math markup such as \\frac, \\times, or $$.
- Write currency with a single leading dollar sign: $95.4 billion. Never close an amount with a second dollar sign.
- Always put a space between a number and the word next to it.
- Do not use stray ** emphasis markers detached from words.
- Keep each section under 150 words unless told otherwise.

Grounding rules:
- Use only the context provided below. Do not invent figures, dates, or events.
- If the context does not support a claim, leave the claim out.
- Avoid vague filler such as 'well-positioned', 'headwinds', or 'remains to be seen'; cite a concrete number or event instead.";

/// Render retrieved items as a numbered context block
pub fn context_block(items: &[ContextItem]) -> String {
    let mut block = String::new();
    for (i, item) in items.iter().enumerate() {
        let _ = write!(block, "{}. {}", i + 1, item.title);
        if !item.source.is_empty() {
            let _ = write!(block, " ({})", item.source);
        }
        if let Some(date) = &item.date {
            let _ = write!(block, " [{date}]");
        }
        block.push('\n');
        if !item.body.is_empty() {
            let _ = writeln!(block, "   {}", item.body);
        }
    }
    block
}

/// Task prompt for a generated section
pub fn section_prompt(kind: SectionKind, ticker: &str, items: &[ContextItem]) -> String {
    let context = context_block(items);
    let task = match kind {
        SectionKind::NewsSummary => format!(
            "Summarize the most consequential recent news for {ticker} in 3 to 5 short bullet \
             points. Lead with anything market-moving."
        ),
        SectionKind::StrategicAnalysis => format!(
            "From the earnings coverage below, write the bull case and the bear case for \
             {ticker}. Two short paragraphs, labeled 'Bull:' and 'Bear:'."
        ),
        SectionKind::FinancialDeepDive => format!(
            "From the coverage below, explain what drove {ticker}'s recent financial results: \
             revenue drivers, margin pressure, and any one-off items analysts called out."
        ),
        SectionKind::SegmentBreakdown => format!(
            "Summarize what the coverage below says about {ticker}'s revenue mix by business \
             segment, including any segment growing or shrinking notably."
        ),
        SectionKind::CoreDriver => format!(
            "In one sentence, name the single most important driver of {ticker}'s stock right \
             now, based only on the coverage below."
        ),
    };

    format!("{BASE_INSTRUCTIONS}\n\nTask: {task}\n\nContext:\n{context}")
}

/// Repair prompt for a draft that failed formatting checks
pub fn repair_prompt(draft: &str, violations: &[Violation]) -> String {
    let mut corrections = String::new();
    for violation in violations {
        let _ = writeln!(corrections, "- {}", violation.correction());
    }

    format!(
        "{BASE_INSTRUCTIONS}\n\nThe draft below breaks these formatting rules:\n{corrections}\n\
         Rewrite the draft with identical content and the formatting fixed. Return only the \
         rewritten text.\n\nDraft:\n{draft}"
    )
}

/// Prompt asking for a ticker's identity profile as JSON
pub fn identity_prompt(ticker: &str) -> String {
    format!(
        "Return a JSON object describing the company behind the stock ticker {ticker}.\n\
         Schema: {{\"ticker\": string, \"sibling_tickers\": [string], \"company_name\": string, \
         \"colloquial_names\": [string], \"products\": [string]}}\n\
         - sibling_tickers: other tickers for the same company (e.g. GOOG and GOOGL), else [].\n\
         - colloquial_names: names the press uses for the company.\n\
         - products: up to 8 flagship product or brand names.\n\
         Return only the JSON object, no prose, no code fences."
    )
}

/// Prompt asking for direct competitors as a JSON list of tickers
pub fn competitors_prompt(ticker: &str) -> String {
    format!(
        "List the 4 most direct publicly traded competitors of the company with stock ticker \
         {ticker}.\nReturn only a JSON array of their ticker symbols, e.g. [\"MSFT\", \"GOOG\"]. \
         No prose, no code fences."
    )
}

/// Prompt asking for segment revenue estimates as JSON
pub fn segments_prompt(ticker: &str, items: &[ContextItem]) -> String {
    let context = context_block(items);
    format!(
        "From the coverage below, estimate {ticker}'s revenue by business segment for the most \
         recent reported quarter.\n\
         Return only a JSON array with schema: [{{\"label\": string, \"value_billions\": number, \
         \"growth\": string}}]\n\
         - label: segment name.\n\
         - value_billions: revenue in billions of dollars.\n\
         - growth: short year-over-year description, e.g. \"+8% YoY\".\n\
         Only include segments the coverage actually supports. No prose, no code fences.\n\n\
         Context:\n{context}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> ContextItem {
        ContextItem {
            title: title.to_string(),
            source: "wire".to_string(),
            date: Some("2025-06-01".to_string()),
            body: "details".to_string(),
        }
    }

    #[test]
    fn test_context_block_numbering() {
        let block = context_block(&[item("First headline"), item("Second headline")]);
        assert!(block.contains("1. First headline (wire) [2025-06-01]"));
        assert!(block.contains("2. Second headline"));
    }

    #[test]
    fn test_section_prompt_carries_base_rules_and_context() {
        let prompt = section_prompt(SectionKind::NewsSummary, "AAPL", &[item("Apple beats")]);
        assert!(prompt.contains("single leading dollar sign"));
        assert!(prompt.contains("AAPL"));
        assert!(prompt.contains("Apple beats"));
    }

    #[test]
    fn test_repair_prompt_names_corrections() {
        let prompt = repair_prompt("bad $1B$ draft", &[Violation::PairedCurrency]);
        assert!(prompt.contains("single leading dollar sign"));
        assert!(prompt.contains("bad $1B$ draft"));
    }

    #[test]
    fn test_json_prompts_forbid_fences() {
        assert!(identity_prompt("GOOG").contains("no code fences"));
        assert!(competitors_prompt("AAPL").contains("no code fences"));
        assert!(segments_prompt("AAPL", &[]).contains("no code fences"));
    }
}
