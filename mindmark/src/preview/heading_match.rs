//! Locating the rendered heading for an active section
//!
//! Outline text keeps its inline markup (`**Setup**`) while rendered
//! headings expose only their text content (`Setup`), so the lookup tries
//! progressively looser comparisons and stops at the first hit.

use regex::Regex;
use std::sync::OnceLock;

/// Comparison that produced a match, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Exact match after removing bold, italic and code markers
    Stripped,
    /// Exact match against the untouched text
    Raw,
    /// One text contains the other (stripped text)
    Contains,
    /// Exact match ignoring case (stripped text)
    CaseInsensitive,
}

/// A successful heading lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Index into the searched heading list
    pub index: usize,
    pub strategy: MatchStrategy,
}

fn markup_patterns() -> &'static [(Regex, &'static str); 3] {
    static PATTERNS: OnceLock<[(Regex, &'static str); 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (Regex::new(r"\*\*(.*?)\*\*").unwrap(), "$1"),
            (Regex::new(r"\*(.*?)\*").unwrap(), "$1"),
            (Regex::new(r"`(.*?)`").unwrap(), "$1"),
        ]
    })
}

/// Remove `**bold**`, `*italic*` and `` `code` `` markers and trim
pub fn strip_inline_markup(text: &str) -> String {
    let stripped = markup_patterns()
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        });
    stripped.trim().to_string()
}

/// Find the heading matching an outline text
///
/// # Parameters
/// * `headings` - Rendered heading texts in document order
/// * `target` - Outline heading text, markup included
///
/// # Returns
/// * `Some(HeadingMatch)` - First heading accepted by the first succeeding strategy
/// * `None` - No strategy matched
pub fn find_heading<S: AsRef<str>>(headings: &[S], target: &str) -> Option<HeadingMatch> {
    let cleaned = strip_inline_markup(target);
    let texts: Vec<&str> = headings.iter().map(|h| h.as_ref().trim()).collect();

    let strategies: [(MatchStrategy, &dyn Fn(&str) -> bool); 4] = [
        (MatchStrategy::Stripped, &|text| text == cleaned),
        (MatchStrategy::Raw, &|text| text == target),
        (MatchStrategy::Contains, &|text| {
            // An empty side would be contained in everything
            !text.is_empty()
                && !cleaned.is_empty()
                && (text.contains(cleaned.as_str()) || cleaned.contains(text))
        }),
        (MatchStrategy::CaseInsensitive, &|text| {
            text.to_lowercase() == cleaned.to_lowercase()
        }),
    ];

    strategies.iter().find_map(|(strategy, accepts)| {
        texts
            .iter()
            .position(|text| accepts(text))
            .map(|index| HeadingMatch {
                index,
                strategy: *strategy,
            })
    })
}
