// src/main.rs
// PREREQ CORE - task catalog builder
// Two passes over the task catalog: CSV -> tasks.json, then wiki-mined
// prerequisite text for collection-log tasks.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cache;
mod catalog;
mod extract;
mod prereq;
mod resolve;
mod tasks;
mod textutil;
mod wiki;

use cache::CachedSource;
use prereq::PrereqBuilder;
use wiki::WikiClient;

#[derive(Parser)]
#[command(name = "prereq_core", version, about = "Task catalog builder with wiki-mined prerequisites")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pass 1: convert a CSV export into tasks.json.
    Build {
        /// CSV export of the task spreadsheet.
        input: PathBuf,
        /// Destination tasks.json.
        output: PathBuf,
        /// Fill missing wikiTitle/wikiUrl/description fields from the wiki.
        #[arg(long)]
        enrich_wiki: bool,
    },
    /// Pass 2: fill missing prereqs in an existing tasks.json.
    Prereqs {
        /// tasks.json produced by the build pass.
        input: PathBuf,
        /// Destination tasks.json with prereqs filled in.
        output: PathBuf,
        /// Cap on how many tasks to attempt this run.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a tasks.json out as a flat CSV for hand review.
    Export {
        /// tasks.json to export.
        input: PathBuf,
        /// Destination review CSV.
        output: PathBuf,
    },
    /// Merge a hand-edited review CSV back into a tasks.json, keyed by id.
    Merge {
        /// Original tasks.json.
        input: PathBuf,
        /// Edited review CSV.
        edited: PathBuf,
        /// Destination merged tasks.json.
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            enrich_wiki,
        } => {
            let mut wiki = CachedSource::new(WikiClient::new());
            catalog::build_catalog(&input, &output, enrich_wiki, &mut wiki)
        }
        Command::Prereqs {
            input,
            output,
            limit,
        } => {
            let mut builder = PrereqBuilder::new(CachedSource::new(WikiClient::new()));
            catalog::fill_prereqs(&input, &output, limit, &mut builder)
        }
        Command::Export { input, output } => catalog::export_review_csv(&input, &output),
        Command::Merge {
            input,
            edited,
            output,
        } => catalog::merge_catalog(&input, &edited, &output).map(|_| ()),
    }
}
