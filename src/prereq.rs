// src/prereq.rs
// The prerequisite pipeline: item page -> first minigame-like link ->
// access clause -> gating quest -> quest requirements, composed into the
// short text block stored on each task.
//
// Every step is a bounded heuristic over wiki content. Anything that
// fails or finds nothing collapses to the literal "None" at the composer
// boundary; a bad task never stops the batch.

use std::collections::HashMap;

use log::{debug, warn};

use crate::extract::{
    access_clause_from_html, contains_access_clause, requirements_from_html, truncate_clause,
    CLAUSE_DISPLAY_CAP,
};
use crate::tasks::{Source, Task};
use crate::wiki::{PageSource, WikiError};

/// Literal stored when nothing resolves.
pub const NO_PREREQS: &str = "None";

const LEAD_SECTION: &str = "0";
const MINIGAME_LINK_BUDGET: usize = 50;
const QUEST_LINK_BUDGET: usize = 80;

pub struct PrereqBuilder<S> {
    wiki: S,
    // Requirements lookups repeat heavily during quest discovery.
    requirements_memo: HashMap<String, Option<String>>,
}

impl<S: PageSource> PrereqBuilder<S> {
    pub fn new(wiki: S) -> Self {
        Self {
            wiki,
            requirements_memo: HashMap::new(),
        }
    }

    /// Composer entry point. Never fails and never returns an empty
    /// string: the result is either "None" or one to two composed lines.
    pub fn prereqs_for_task(&mut self, task: &Task) -> String {
        let Some(title) = task.wiki_title.as_deref() else {
            return NO_PREREQS.to_string();
        };
        match task.source {
            // Combat achievement prereqs are deliberately not derived.
            Source::CombatAchievement => NO_PREREQS.to_string(),
            Source::CollectionLog => match self.collection_log_prereqs(title) {
                Ok(block) => block,
                Err(err) => {
                    warn!("prereq lookup for '{}' failed: {err}", task.name);
                    NO_PREREQS.to_string()
                }
            },
        }
    }

    fn collection_log_prereqs(&mut self, item_title: &str) -> Result<String, WikiError> {
        let Some(minigame) = self.first_minigame_like_link(item_title)? else {
            return Ok(NO_PREREQS.to_string());
        };

        // Already cached from the scan above.
        let clause = match self.wiki.page_html(&minigame)? {
            Some(html) => access_clause_from_html(&html),
            None => None,
        };

        let quest = self.first_quest_like_link(&minigame)?;
        let quest_req = match &quest {
            Some(title) => self.quest_requirements(title)?,
            None => None,
        };

        let mut lines = Vec::new();
        if let (Some(title), Some(req)) = (quest, quest_req) {
            lines.push(format!("{title}: {req}"));
        }
        if let Some(clause) = clause {
            let clause = truncate_clause(&clause, CLAUSE_DISPLAY_CAP);
            lines.push(format!("{minigame}: {clause}"));
        }

        if lines.is_empty() {
            Ok(NO_PREREQS.to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }

    /// First lead-section link whose page carries a "To play" clause.
    /// Bounded linear scan; exhausting the budget is a normal miss.
    fn first_minigame_like_link(&mut self, item_title: &str) -> Result<Option<String>, WikiError> {
        let links = self
            .wiki
            .section_links(item_title, LEAD_SECTION, MINIGAME_LINK_BUDGET)?;
        for link in links {
            let Some(html) = self.wiki.page_html(&link)? else {
                continue;
            };
            if contains_access_clause(&html) {
                debug!("minigame candidate for '{item_title}': {link}");
                return Ok(Some(link));
            }
        }
        Ok(None)
    }

    /// First link with a Requirements row, taken as the gating quest.
    /// A guess, not a verified causal link.
    fn first_quest_like_link(&mut self, minigame_title: &str) -> Result<Option<String>, WikiError> {
        let links = self
            .wiki
            .section_links(minigame_title, LEAD_SECTION, QUEST_LINK_BUDGET)?;
        for link in links {
            if self.quest_requirements(&link)?.is_some() {
                debug!("quest candidate for '{minigame_title}': {link}");
                return Ok(Some(link));
            }
        }
        Ok(None)
    }

    fn quest_requirements(&mut self, title: &str) -> Result<Option<String>, WikiError> {
        if let Some(memo) = self.requirements_memo.get(title) {
            return Ok(memo.clone());
        }
        let req = match self.wiki.page_html(title)? {
            Some(html) => requirements_from_html(&html),
            None => None,
        };
        self.requirements_memo.insert(title.to_string(), req.clone());
        Ok(req)
    }
}
