//! Formatting checks for generated text
//!
//! Generated sections are rendered in a plain-text terminal, so math markup
//! and stray Markdown artifacts are treated as defects. The scanner reports
//! every violation class it finds; the generator uses the report to drive a
//! single repair attempt.

use regex::Regex;
use std::sync::LazyLock;

/// A formatting defect found in generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Currency written with both a leading and trailing dollar sign
    PairedCurrency,
    /// LaTeX-style math markup
    MathMarkup,
    /// A `**` emphasis marker detached from any word
    DetachedEmphasis,
    /// A digit fused to a word with no separating space
    CrampedNumber,
}

impl Violation {
    /// Instruction fragment used when asking for a repair
    pub fn correction(&self) -> &'static str {
        match self {
            Self::PairedCurrency => {
                "Write currency with a single leading dollar sign, e.g. $95.4 billion."
            }
            Self::MathMarkup => "Remove all LaTeX or math markup; use plain text only.",
            Self::DetachedEmphasis => "Remove stray ** markers that are not attached to a word.",
            Self::CrampedNumber => "Put a space between every number and the word next to it.",
        }
    }
}

// `$95.4B$` or `$ 12 $`: a dollar amount closed by a second dollar sign.
static PAIRED_CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s?[\d.,]+\s?[a-zA-Z]*\$").expect("valid regex"));

static MATH_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\frac|\\text|\\times|\$\$|\\\(|\\\[").expect("valid regex")
});

// A `**` token surrounded by whitespace is emphasis that lost its word.
static DETACHED_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)\*\*(\s|$)").expect("valid regex"));

// "123billion" or "revenue123": three or more letters fused to a digit.
static CRAMPED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d[a-zA-Z]{3,}|[a-zA-Z]{3,}\d").expect("valid regex")
});

/// Scan text for formatting violations
pub fn scan(text: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    if PAIRED_CURRENCY.is_match(text) {
        violations.push(Violation::PairedCurrency);
    }
    if MATH_MARKUP.is_match(text) {
        violations.push(Violation::MathMarkup);
    }
    if DETACHED_EMPHASIS.is_match(text) {
        violations.push(Violation::DetachedEmphasis);
    }
    if CRAMPED_NUMBER.is_match(text) {
        violations.push(Violation::CrampedNumber);
    }
    violations
}

/// Whether text passes every formatting check
pub fn is_clean(text: &str) -> bool {
    scan(text).is_empty()
}

/// Strip Markdown code fences from a model response expected to be JSON.
///
/// Handles ```json ... ``` and bare ``` fences; anything else is returned
/// trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paired_currency_flagged() {
        assert!(scan("Revenue was $95.4B$ this quarter").contains(&Violation::PairedCurrency));
        assert!(scan("Revenue was $95.4 billion this quarter").is_empty());
    }

    #[test]
    fn test_math_markup_flagged() {
        assert!(scan(r"margin of \frac{60}{120}").contains(&Violation::MathMarkup));
        assert!(scan(r"price moved \( x \) points").contains(&Violation::MathMarkup));
        assert!(scan("$$42$$").contains(&Violation::MathMarkup));
    }

    #[test]
    fn test_detached_emphasis_flagged() {
        assert!(scan("Strong quarter ** with upside").contains(&Violation::DetachedEmphasis));
        assert!(!scan("**Strong** quarter").contains(&Violation::DetachedEmphasis));
    }

    #[test]
    fn test_cramped_number_flagged() {
        assert!(scan("grew 12percent this year").contains(&Violation::CrampedNumber));
        assert!(scan("revenue12 looks odd").contains(&Violation::CrampedNumber));
        assert!(!scan("grew 12 percent, Q3 was fine").contains(&Violation::CrampedNumber));
    }

    #[test]
    fn test_clean_text_passes() {
        let text = "Revenue grew 8 percent to $95.4 billion, with margins steady.";
        assert!(is_clean(text));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }
}
