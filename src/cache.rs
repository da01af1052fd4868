// src/cache.rs
// Run-scoped memoization of wiki lookups, one map per query kind.
// Misses are cached alongside hits so a failed lookup is not retried
// within the same run; transport errors are never cached. The pipeline
// is single-threaded, so plain HashMaps are all this needs.

use std::collections::HashMap;

use crate::wiki::{PageSource, WikiError};

/// Caching decorator over any [`PageSource`]. One instance per run; tests
/// get isolation by wrapping a fresh fake per test.
pub struct CachedSource<S> {
    inner: S,
    search: HashMap<String, Option<String>>,
    extract: HashMap<(String, u32), Option<String>>,
    html: HashMap<String, Option<String>>,
    links: HashMap<(String, String, usize), Vec<String>>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            search: HashMap::new(),
            extract: HashMap::new(),
            html: HashMap::new(),
            links: HashMap::new(),
        }
    }
}

impl<S: PageSource> PageSource for CachedSource<S> {
    fn search_best_title(&mut self, query: &str) -> Result<Option<String>, WikiError> {
        // Free-text queries key case-insensitively.
        let key = query.trim().to_lowercase();
        if let Some(hit) = self.search.get(&key) {
            return Ok(hit.clone());
        }
        let title = self.inner.search_best_title(query)?;
        self.search.insert(key, title.clone());
        Ok(title)
    }

    fn lead_extract(&mut self, title: &str, chars: u32) -> Result<Option<String>, WikiError> {
        let key = (title.to_string(), chars);
        if let Some(hit) = self.extract.get(&key) {
            return Ok(hit.clone());
        }
        let extract = self.inner.lead_extract(title, chars)?;
        self.extract.insert(key, extract.clone());
        Ok(extract)
    }

    fn page_html(&mut self, title: &str) -> Result<Option<String>, WikiError> {
        if let Some(hit) = self.html.get(title) {
            return Ok(hit.clone());
        }
        let html = self.inner.page_html(title)?;
        self.html.insert(title.to_string(), html.clone());
        Ok(html)
    }

    fn section_links(
        &mut self,
        title: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<String>, WikiError> {
        let key = (title.to_string(), section.to_string(), limit);
        if let Some(hit) = self.links.get(&key) {
            return Ok(hit.clone());
        }
        let links = self.inner.section_links(title, section, limit)?;
        self.links.insert(key, links.clone());
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts how often each query kind reaches the underlying source.
    #[derive(Default)]
    struct CountingSource {
        searches: usize,
        extracts: usize,
        htmls: usize,
        links: usize,
    }

    impl PageSource for CountingSource {
        fn search_best_title(&mut self, query: &str) -> Result<Option<String>, WikiError> {
            self.searches += 1;
            Ok(if query.eq_ignore_ascii_case("coal") {
                Some("Coal".to_string())
            } else {
                None
            })
        }

        fn lead_extract(&mut self, _title: &str, _chars: u32) -> Result<Option<String>, WikiError> {
            self.extracts += 1;
            Ok(Some("A lump of coal.".to_string()))
        }

        fn page_html(&mut self, title: &str) -> Result<Option<String>, WikiError> {
            self.htmls += 1;
            Ok(if title == "Missing" {
                None
            } else {
                Some(format!("<p>{title}</p>"))
            })
        }

        fn section_links(
            &mut self,
            _title: &str,
            _section: &str,
            _limit: usize,
        ) -> Result<Vec<String>, WikiError> {
            self.links += 1;
            Ok(vec!["A".to_string(), "B".to_string()])
        }
    }

    #[test]
    fn each_key_reaches_the_source_at_most_once() {
        let mut wiki = CachedSource::new(CountingSource::default());

        for _ in 0..3 {
            wiki.search_best_title("coal").unwrap();
            wiki.lead_extract("Coal", 520).unwrap();
            wiki.page_html("Coal").unwrap();
            wiki.section_links("Coal", "0", 50).unwrap();
        }

        assert_eq!(wiki.inner.searches, 1);
        assert_eq!(wiki.inner.extracts, 1);
        assert_eq!(wiki.inner.htmls, 1);
        assert_eq!(wiki.inner.links, 1);
    }

    #[test]
    fn search_keys_are_case_insensitive() {
        let mut wiki = CachedSource::new(CountingSource::default());
        assert_eq!(wiki.search_best_title("Coal").unwrap(), Some("Coal".to_string()));
        assert_eq!(wiki.search_best_title("  COAL ").unwrap(), Some("Coal".to_string()));
        assert_eq!(wiki.inner.searches, 1);
    }

    #[test]
    fn misses_are_cached_too() {
        let mut wiki = CachedSource::new(CountingSource::default());
        assert_eq!(wiki.page_html("Missing").unwrap(), None);
        assert_eq!(wiki.page_html("Missing").unwrap(), None);
        assert_eq!(wiki.inner.htmls, 1);

        assert_eq!(wiki.search_best_title("nothing").unwrap(), None);
        assert_eq!(wiki.search_best_title("nothing").unwrap(), None);
        assert_eq!(wiki.inner.searches, 1);
    }

    #[test]
    fn distinct_parameters_are_distinct_keys() {
        let mut wiki = CachedSource::new(CountingSource::default());
        wiki.lead_extract("Coal", 520).unwrap();
        wiki.lead_extract("Coal", 200).unwrap();
        assert_eq!(wiki.inner.extracts, 2);

        wiki.section_links("Coal", "0", 50).unwrap();
        wiki.section_links("Coal", "0", 80).unwrap();
        assert_eq!(wiki.inner.links, 2);
    }
}
