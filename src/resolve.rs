// src/resolve.rs
// Maps a task's display name to its most likely wiki page title.
// Collection-log names are task phrasings ("Get a Dragon dagger from
// Monster X"), so the probable item name is carved out first; combat
// achievement names are searched verbatim.

use std::sync::LazyLock;

use regex::Regex;

use crate::tasks::Source;
use crate::wiki::{PageSource, WikiError};

static GET_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Get\s+(.+?)\s+from\s+.+$").unwrap());
static GET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Get\s+(.+)$").unwrap());
static PLUS_VARIANT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\+\s*").unwrap());
static LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(a|an|the)\s+").unwrap());
static LEADING_QUANTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\s+").unwrap());

/// Derives the probable item name from a collection-log task's phrasing.
pub fn collection_log_item_name(task_name: &str) -> String {
    let s = task_name.trim();

    let item = if let Some(caps) = GET_FROM.captures(s) {
        caps[1].trim().to_string()
    } else if let Some(caps) = GET.captures(s) {
        caps[1].trim().to_string()
    } else {
        s.to_string()
    };

    // "Rune scimitar + 1" style variants collapse to the base item.
    let item = PLUS_VARIANT.split(&item).next().unwrap_or("").trim().to_string();
    let item = LEADING_ARTICLE.replace(&item, "");
    let item = LEADING_QUANTITY.replace(&item, "");
    item.trim().to_string()
}

/// Resolves a task name to a wiki title via full-text search, or None
/// when the cleaned name is empty or the search comes up dry.
pub fn resolve_wiki_title(
    name: &str,
    source: Source,
    wiki: &mut impl PageSource,
) -> Result<Option<String>, WikiError> {
    match source {
        Source::CombatAchievement => wiki.search_best_title(name),
        Source::CollectionLog => {
            let item = collection_log_item_name(name);
            if item.is_empty() {
                return Ok(None);
            }
            wiki.search_best_title(&item)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_from_phrasing_takes_the_item() {
        assert_eq!(
            collection_log_item_name("Get a Dragon dagger from Monster X"),
            "Dragon dagger"
        );
    }

    #[test]
    fn quantity_prefix_is_dropped() {
        assert_eq!(collection_log_item_name("Get 3 Ensouled heads"), "Ensouled heads");
    }

    #[test]
    fn plus_variant_suffix_is_dropped() {
        assert_eq!(collection_log_item_name("Get Rune scimitar + 1"), "Rune scimitar");
    }

    #[test]
    fn plain_names_pass_through_cleaned() {
        assert_eq!(collection_log_item_name("The Abyssal whip"), "Abyssal whip");
        assert_eq!(collection_log_item_name("  Coal bag  "), "Coal bag");
    }

    #[test]
    fn article_inside_get_phrasing_is_stripped() {
        assert_eq!(collection_log_item_name("Get an Ancient shard"), "Ancient shard");
    }
}
