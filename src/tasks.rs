// src/tasks.rs
// Task catalog data model shared by the CSV build and the prereq fill.
// Serializes camelCase to match the tasks.json the plugin consumes.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::wiki::WIKI_PAGE_BASE;

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "COMBAT_ACHIEVEMENT")]
    CombatAchievement,
    #[serde(rename = "COLLECTION_LOG")]
    CollectionLog,
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMBAT_ACHIEVEMENT" => Ok(Source::CombatAchievement),
            "COLLECTION_LOG" => Ok(Source::CollectionLog),
            other => Err(format!("invalid source '{other}'")),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::CombatAchievement => "COMBAT_ACHIEVEMENT",
            Source::CollectionLog => "COLLECTION_LOG",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Easy,
    Medium,
    Hard,
    Elite,
    Master,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EASY" => Ok(Tier::Easy),
            "MEDIUM" => Ok(Tier::Medium),
            "HARD" => Ok(Tier::Hard),
            "ELITE" => Ok(Tier::Elite),
            // The in-game GRANDMASTER tier folds into MASTER.
            "MASTER" | "GRANDMASTER" => Ok(Tier::Master),
            other => Err(format!("invalid tier '{other}'")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Easy => "EASY",
            Tier::Medium => "MEDIUM",
            Tier::Hard => "HARD",
            Tier::Elite => "ELITE",
            Tier::Master => "MASTER",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub source: Source,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_item_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_key: Option<String>,
    #[serde(default = "default_prereqs")]
    pub prereqs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    // Hand-maintained task files carry fields this tool doesn't know
    // about; they must survive a rewrite untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_prereqs() -> String {
    "None".to_string()
}

/// On-disk shape of tasks.json.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskFile {
    pub version: u32,
    pub tasks: Vec<Task>,
}

/// Lowercased, tag-stripped, hyphen-joined form of a name.
pub fn slug(s: &str) -> String {
    let lowered = s.trim().to_lowercase();
    let stripped = TAGS.replace_all(&lowered, "");

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Deterministic row id. Duplicate (source, tier, name) rows are kept
/// apart by their occurrence number, so re-running the build never
/// reshuffles ids.
pub fn stable_row_id(source: Source, tier: Tier, name: &str, occurrence: u32) -> String {
    let base = format!("{source}|{tier}|{name}|{occurrence}")
        .trim()
        .to_lowercase();
    let digest = Sha256::digest(base.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();

    let slugged: String = slug(name).chars().take(40).collect();
    format!(
        "{}_{}_{}_{:03}_{}",
        source.to_string().to_lowercase(),
        tier.to_string().to_lowercase(),
        slugged,
        occurrence,
        &hex[..10]
    )
}

/// Browser URL for a wiki page title.
pub fn wiki_title_to_url(title: &str) -> String {
    format!("{WIKI_PAGE_BASE}{}", urlencoding::encode(&title.replace(' ', "_")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_tags_and_collapses_punctuation() {
        assert_eq!(slug("  Get a <b>Dragon</b> dagger!  "), "get-a-dragon-dagger");
        assert_eq!(slug("K'ril Tsutsaroth"), "k-ril-tsutsaroth");
        assert_eq!(slug("---"), "");
    }

    #[test]
    fn grandmaster_folds_into_master() {
        assert_eq!("GRANDMASTER".parse::<Tier>(), Ok(Tier::Master));
        assert_eq!(" easy ".parse::<Tier>(), Ok(Tier::Easy));
        assert!("LEGENDARY".parse::<Tier>().is_err());
    }

    #[test]
    fn row_ids_are_stable_and_occurrence_scoped() {
        let a = stable_row_id(Source::CollectionLog, Tier::Easy, "Get a Coal bag", 1);
        let b = stable_row_id(Source::CollectionLog, Tier::Easy, "Get a Coal bag", 1);
        let c = stable_row_id(Source::CollectionLog, Tier::Easy, "Get a Coal bag", 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("collection_log_easy_get-a-coal-bag_001_"));
    }

    #[test]
    fn wiki_urls_use_underscored_titles() {
        assert_eq!(
            wiki_title_to_url("Dragon dagger"),
            "https://oldschool.runescape.wiki/w/Dragon_dagger"
        );
    }

    #[test]
    fn task_json_round_trips_with_optional_fields() {
        let json = r#"{
            "id": "x",
            "name": "Get a Coal bag",
            "source": "COLLECTION_LOG",
            "tier": "EASY"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.prereqs, "None");
        assert_eq!(task.wiki_title, None);

        let out = serde_json::to_string(&task).unwrap();
        assert!(!out.contains("wikiTitle"));
        assert!(out.contains("\"prereqs\":\"None\""));
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let json = r#"{
            "id": "x",
            "name": "Get a Coal bag",
            "source": "COLLECTION_LOG",
            "tier": "EASY",
            "notes": "checked by hand 2024-11",
            "sortOrder": 7
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.extra["notes"], "checked by hand 2024-11");

        let out = serde_json::to_string(&task).unwrap();
        assert!(out.contains("\"notes\":\"checked by hand 2024-11\""));
        assert!(out.contains("\"sortOrder\":7"));
    }
}
