// src/extract.rs
// Text-pattern scans over rendered wiki HTML. Both extractors are
// heuristics over a human-edited corpus: a miss is a normal outcome and
// comes back as None.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::textutil::{html_to_text, squash_whitespace};

/// Visible-character cap on a rendered access clause.
pub const CLAUSE_DISPLAY_CAP: usize = 240;

// "To play ..." run over raw HTML, stopping at the next tag boundary.
static RAW_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)To play[^<]{0,600}").unwrap());
// Fallback over already-normalized page text: a "To play ..." sentence.
static TEXT_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)To play[^.]{0,600}\.").unwrap());
static ACCESS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bTo play\b").unwrap());

/// Pulls the quest-infobox "Requirements" cell out of a rendered page.
///
/// The first row in document order whose header cell reads "Requirements"
/// (case-insensitive) decides the outcome; pages with several infoboxes
/// resolve by first occurrence, not relevance.
pub fn requirements_from_html(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let rows = Selector::parse("tr").unwrap();
    let headers = Selector::parse("th").unwrap();
    let cells = Selector::parse("td").unwrap();

    for row in doc.select(&rows) {
        let labelled = row.select(&headers).any(|th| {
            let label = th.text().collect::<String>();
            label.trim().eq_ignore_ascii_case("requirements")
        });
        if !labelled {
            continue;
        }
        let td = row.select(&cells).next()?;
        let text = squash_whitespace(&html_to_text(&td.inner_html()));
        return (!text.is_empty()).then_some(text);
    }
    None
}

/// Does this page read like a joinable activity?
pub fn contains_access_clause(html: &str) -> bool {
    ACCESS_MARKER.is_match(html)
}

/// Extracts the "To play ..." access clause from a page's raw HTML,
/// falling back to a sentence scan over the normalized page text.
pub fn access_clause_from_html(html: &str) -> Option<String> {
    if let Some(m) = RAW_CLAUSE.find(html) {
        return Some(squash_whitespace(&html_to_text(m.as_str())));
    }
    let page_text = html_to_text(html);
    TEXT_CLAUSE
        .find(&page_text)
        .map(|m| squash_whitespace(m.as_str()))
}

/// Caps a clause at `cap` visible characters, marking the cut with an
/// ellipsis.
pub fn truncate_clause(clause: &str, cap: usize) -> String {
    if clause.chars().count() <= cap {
        return clause.to_string();
    }
    let cut: String = clause.chars().take(cap).collect();
    format!("{}\u{2026}", cut.trim_end())
}
