// src/catalog.rs
// Batch glue around the prereq pipeline: CSV export -> tasks.json
// (pass 1), then filling prereqs into an existing tasks.json (pass 2).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{error, info};

use crate::prereq::{PrereqBuilder, NO_PREREQS};
use crate::resolve::resolve_wiki_title;
use crate::tasks::{stable_row_id, wiki_title_to_url, Source, Task, TaskFile, Tier};
use crate::wiki::PageSource;

const DESCRIPTION_CHARS: u32 = 520;

/// Pass 1: read a CSV export, validate every row, and write a versioned
/// tasks.json. With `enrich` set, missing wiki fields are filled from
/// the wiki on the way through.
pub fn build_catalog(
    csv_path: &Path,
    out_path: &Path,
    enrich: bool,
    wiki: &mut impl PageSource,
) -> Result<()> {
    let raw = fs::read_to_string(csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let cleaned = strip_table_banner(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(cleaned.as_bytes());

    // Spreadsheet exports are sloppy about header casing.
    let mut column: HashMap<String, usize> = HashMap::new();
    for (idx, header) in reader.headers().context("reading CSV header")?.iter().enumerate() {
        column.insert(header.trim().to_lowercase(), idx);
    }
    if column.is_empty() {
        bail!("CSV appears to have no header row");
    }
    let field = |record: &csv::StringRecord, key: &str| -> String {
        column
            .get(key)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut tasks: Vec<Task> = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    let mut occurrences: HashMap<String, u32> = HashMap::new();

    for (row_idx, record) in reader.records().enumerate() {
        let record = record.context("reading CSV row")?;
        let line = row_idx + 2; // line 1 is the header

        let source_raw = field(&record, "source").to_uppercase();
        let tier_raw = field(&record, "tier").to_uppercase();
        let name = field(&record, "name");
        let prereqs = field(&record, "prereqs");
        let wiki_title = field(&record, "wikititle");
        let wiki_url = field(&record, "wikiurl");
        let description = field(&record, "description");
        let icon_item_id_raw = field(&record, "iconitemid");
        let icon_key = field(&record, "iconkey");

        // Blank row, skip.
        if source_raw.is_empty()
            && tier_raw.is_empty()
            && name.is_empty()
            && icon_item_id_raw.is_empty()
            && icon_key.is_empty()
        {
            continue;
        }

        let source = match source_raw.parse::<Source>() {
            Ok(source) => source,
            Err(reason) => {
                errors.push(format!("line {line}: {reason}"));
                continue;
            }
        };
        let tier = match tier_raw.parse::<Tier>() {
            Ok(tier) => tier,
            Err(reason) => {
                errors.push(format!("line {line}: {reason}"));
                continue;
            }
        };
        if name.is_empty() {
            errors.push(format!("line {line}: missing name"));
            continue;
        }

        let icon_item_id = if icon_item_id_raw.is_empty() {
            None
        } else {
            match icon_item_id_raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(format!(
                        "line {line}: iconItemId must be an integer, got '{icon_item_id_raw}'"
                    ));
                    continue;
                }
            }
        };

        // Intentional duplicates keep distinct ids via their occurrence.
        let occurrence_key = format!("{source}|{tier}|{name}").to_lowercase();
        let occurrence = occurrences
            .entry(occurrence_key)
            .and_modify(|n| *n += 1)
            .or_insert(1);
        let id = stable_row_id(source, tier, &name, *occurrence);

        let mut task = Task {
            id,
            name,
            source,
            tier,
            icon_item_id,
            icon_key: (!icon_key.is_empty()).then_some(icon_key),
            prereqs: if prereqs.is_empty() {
                NO_PREREQS.to_string()
            } else {
                prereqs
            },
            wiki_title: (!wiki_title.is_empty()).then_some(wiki_title),
            wiki_url: (!wiki_url.is_empty()).then_some(wiki_url),
            description: (!description.is_empty()).then_some(description),
            extra: serde_json::Map::new(),
        };

        if enrich {
            enrich_task(&mut task, wiki)?;
        }

        tasks.push(task);
        if line % 50 == 0 {
            info!("pass 1 processed up to CSV line {line}");
        }
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("{err}");
        }
        bail!("{} invalid CSV rows", errors.len());
    }

    let file = TaskFile { version: 1, tasks };
    write_task_file(out_path, &file)?;
    println!("✅ Pass 1 wrote {} tasks to {}", file.tasks.len(), out_path.display());
    Ok(())
}

/// Pass 2: walk an existing tasks.json and compute prereqs for tasks
/// that still carry the "None" placeholder. `limit` caps how many tasks
/// are attempted this run.
pub fn fill_prereqs<S: PageSource>(
    in_path: &Path,
    out_path: &Path,
    limit: Option<usize>,
    builder: &mut PrereqBuilder<S>,
) -> Result<()> {
    let raw = fs::read_to_string(in_path)
        .with_context(|| format!("reading {}", in_path.display()))?;
    let mut file: TaskFile =
        serde_json::from_str(&raw).context("invalid tasks.json: expected {version, tasks}")?;

    let total = file.tasks.len();
    let mut attempted = 0usize;

    for (idx, task) in file.tasks.iter_mut().enumerate() {
        if limit.is_some_and(|cap| attempted >= cap) {
            break;
        }
        // Hand-filled prereqs are left alone.
        if !task.prereqs.trim().is_empty() && task.prereqs != NO_PREREQS {
            continue;
        }
        // A blank wikiTitle in a hand-edited file counts as missing.
        let has_title = task
            .wiki_title
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_title {
            task.prereqs = NO_PREREQS.to_string();
            attempted += 1;
            continue;
        }

        let block = builder.prereqs_for_task(task);
        task.prereqs = block;
        attempted += 1;

        if (idx + 1) % 20 == 0 {
            println!("pass 2 progress: {}/{} tasks scanned, {attempted} attempted", idx + 1, total);
        }
    }

    write_task_file(out_path, &file)?;
    println!("✅ Pass 2 wrote updated prereqs to {} ({attempted} tasks attempted)", out_path.display());
    Ok(())
}

/// Column order of the review CSV; the merge pass reads the same shape
/// back.
const REVIEW_COLUMNS: [&str; 10] = [
    "id",
    "source",
    "tier",
    "name",
    "wikiTitle",
    "wikiUrl",
    "description",
    "prereqs",
    "iconItemId",
    "iconKey",
];

/// Writes a tasks.json out as a flat CSV for hand review. Absent
/// optionals become empty cells.
pub fn export_review_csv(in_path: &Path, out_path: &Path) -> Result<()> {
    let raw = fs::read_to_string(in_path)
        .with_context(|| format!("reading {}", in_path.display()))?;
    let file: TaskFile =
        serde_json::from_str(&raw).context("invalid tasks.json: expected {version, tasks}")?;

    let mut writer = csv::Writer::from_path(out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;
    writer.write_record(REVIEW_COLUMNS)?;

    for task in &file.tasks {
        let source = task.source.to_string();
        let tier = task.tier.to_string();
        let icon_item_id = task.icon_item_id.map(|id| id.to_string()).unwrap_or_default();
        writer.write_record([
            task.id.as_str(),
            source.as_str(),
            tier.as_str(),
            task.name.as_str(),
            task.wiki_title.as_deref().unwrap_or(""),
            task.wiki_url.as_deref().unwrap_or(""),
            task.description.as_deref().unwrap_or(""),
            task.prereqs.as_str(),
            icon_item_id.as_str(),
            task.icon_key.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    println!("✅ Wrote {} review rows to {}", file.tasks.len(), out_path.display());
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Tasks whose fields actually changed.
    pub updated: usize,
    /// CSV ids with no matching task in the JSON.
    pub missing: usize,
}

/// Overlays a hand-edited review CSV back onto a tasks.json, keyed by
/// task id. Only prereqs/wikiTitle/wikiUrl/description are writable from
/// review, and a blank cell never overwrites an existing value.
pub fn merge_catalog(json_path: &Path, csv_path: &Path, out_path: &Path) -> Result<MergeOutcome> {
    let raw = fs::read_to_string(json_path)
        .with_context(|| format!("reading {}", json_path.display()))?;
    let mut file: TaskFile =
        serde_json::from_str(&raw).context("invalid tasks.json: expected {version, tasks}")?;

    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (idx, task) in file.tasks.iter().enumerate() {
        if !task.id.is_empty() {
            by_id.insert(task.id.clone(), idx);
        }
    }
    if by_id.is_empty() {
        bail!("no tasks with an id in {}", json_path.display());
    }

    let raw_csv = fs::read_to_string(csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw_csv.as_bytes());

    let mut column: HashMap<String, usize> = HashMap::new();
    for (idx, header) in reader.headers().context("reading CSV header")?.iter().enumerate() {
        column.insert(header.trim().to_lowercase(), idx);
    }
    if !column.contains_key("id") {
        bail!("edited CSV must have an 'id' column");
    }
    let field = |record: &csv::StringRecord, key: &str| -> String {
        column
            .get(key)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let mut outcome = MergeOutcome {
        updated: 0,
        missing: 0,
    };

    for record in reader.records() {
        let record = record.context("reading CSV row")?;
        let id = field(&record, "id");
        if id.is_empty() {
            continue;
        }
        let Some(&idx) = by_id.get(&id) else {
            outcome.missing += 1;
            continue;
        };
        let task = &mut file.tasks[idx];

        let mut changed = false;
        let prereqs = field(&record, "prereqs");
        if !prereqs.is_empty() && task.prereqs != prereqs {
            task.prereqs = prereqs;
            changed = true;
        }
        changed |= overlay(&mut task.wiki_title, field(&record, "wikititle"));
        changed |= overlay(&mut task.wiki_url, field(&record, "wikiurl"));
        changed |= overlay(&mut task.description, field(&record, "description"));

        if changed {
            outcome.updated += 1;
        }
    }

    write_task_file(out_path, &file)?;
    println!(
        "✅ Merge updated {} tasks ({} CSV ids missing from JSON), wrote {}",
        outcome.updated,
        outcome.missing,
        out_path.display()
    );
    Ok(outcome)
}

// Blank review cells never overwrite.
fn overlay(slot: &mut Option<String>, value: String) -> bool {
    if value.is_empty() || slot.as_deref() == Some(value.as_str()) {
        return false;
    }
    *slot = Some(value);
    true
}

fn enrich_task(task: &mut Task, wiki: &mut impl PageSource) -> Result<()> {
    if task.wiki_title.is_none() {
        task.wiki_title = resolve_wiki_title(&task.name, task.source, wiki)?;
    }
    if let Some(title) = task.wiki_title.clone() {
        if task.wiki_url.is_none() {
            task.wiki_url = Some(wiki_title_to_url(&title));
        }
        // Only combat achievements carry a description blurb.
        if task.source == Source::CombatAchievement && task.description.is_none() {
            task.description = wiki.lead_extract(&title, DESCRIPTION_CHARS)?;
        }
    }
    Ok(())
}

fn write_task_file(path: &Path, file: &TaskFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn strip_table_banner(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    // Numbers exports prepend a "Table 1" banner line.
    if lines.first().is_some_and(|l| l.trim() == "Table 1") {
        lines.remove(0);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
