// src/wiki.rs
// Wiki Access Layer: the four MediaWiki query shapes the pipeline needs.
// A page the wiki doesn't have comes back as Ok(None)/empty; only
// transport or payload trouble is an error, and that error is fatal for
// the one query only.

use std::time::Duration;

use log::debug;
use serde_json::Value;
use thiserror::Error;

pub const WIKI_API: &str = "https://oldschool.runescape.wiki/api.php";
pub const WIKI_PAGE_BASE: &str = "https://oldschool.runescape.wiki/w/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);
const USER_AGENT: &str = "prereq_core/0.1 (task catalog builder)";

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("wiki request failed: {0}")]
    Transport(String),
    #[error("unexpected wiki payload: {0}")]
    Payload(String),
}

impl From<ureq::Error> for WikiError {
    fn from(err: ureq::Error) -> Self {
        WikiError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for WikiError {
    fn from(err: std::io::Error) -> Self {
        WikiError::Payload(err.to_string())
    }
}

/// The query surface the prereq pipeline runs against. Implemented by
/// [`WikiClient`] for the live wiki and by in-memory fakes in tests.
pub trait PageSource {
    /// Best-matching main-namespace page title for a free-text query.
    fn search_best_title(&mut self, query: &str) -> Result<Option<String>, WikiError>;

    /// Lead plain-text summary of a page, truncated to `chars` characters.
    fn lead_extract(&mut self, title: &str, chars: u32) -> Result<Option<String>, WikiError>;

    /// Complete rendered HTML body of a page, redirects resolved.
    fn page_html(&mut self, title: &str) -> Result<Option<String>, WikiError>;

    /// Outbound main-namespace link titles from one page section, in the
    /// wiki's rendered order, capped at `limit`.
    fn section_links(
        &mut self,
        title: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<String>, WikiError>;
}

/// Blocking HTTP client for the wiki's api.php endpoint.
pub struct WikiClient {
    agent: ureq::Agent,
}

impl WikiClient {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }

    fn query(&self, params: &[(&str, &str)]) -> Result<Value, WikiError> {
        let mut request = self.agent.get(WIKI_API);
        for (key, value) in params {
            request = request.query(key, value);
        }
        let data: Value = request.call()?.into_json()?;
        Ok(data)
    }
}

impl Default for WikiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for WikiClient {
    fn search_best_title(&mut self, query: &str) -> Result<Option<String>, WikiError> {
        debug!("wiki search: {query}");
        let data = self.query(&[
            ("action", "query"),
            ("format", "json"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
            ("srprop", ""),
            ("srnamespace", "0"),
        ])?;
        let title = data["query"]["search"]
            .get(0)
            .and_then(|hit| hit["title"].as_str())
            .map(str::to_string);
        Ok(title)
    }

    fn lead_extract(&mut self, title: &str, chars: u32) -> Result<Option<String>, WikiError> {
        debug!("wiki extract: {title} ({chars} chars)");
        let chars = chars.to_string();
        let data = self.query(&[
            ("action", "query"),
            ("format", "json"),
            ("prop", "extracts"),
            ("titles", title),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("exchars", &chars),
            ("redirects", "1"),
        ])?;
        let extract = data["query"]["pages"].as_object().and_then(|pages| {
            pages
                .values()
                .find_map(|page| page["extract"].as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });
        Ok(extract)
    }

    fn page_html(&mut self, title: &str) -> Result<Option<String>, WikiError> {
        debug!("wiki parse html: {title}");
        let data = self.query(&[
            ("action", "parse"),
            ("format", "json"),
            ("page", title),
            ("prop", "text"),
            ("redirects", "1"),
        ])?;
        // A missing page answers with an "error" object, not parse.text.
        Ok(data["parse"]["text"]["*"].as_str().map(str::to_string))
    }

    fn section_links(
        &mut self,
        title: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<String>, WikiError> {
        debug!("wiki links: {title} section {section}");
        let data = self.query(&[
            ("action", "parse"),
            ("format", "json"),
            ("page", title),
            ("prop", "links"),
            ("section", section),
            ("redirects", "1"),
        ])?;

        let mut out = Vec::new();
        if let Some(links) = data["parse"]["links"].as_array() {
            for link in links {
                // Main content namespace only.
                if link["ns"].as_i64() != Some(0) {
                    continue;
                }
                if let Some(target) = link["*"].as_str() {
                    out.push(target.to_string());
                }
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }
}
