//! Concrete commands built on the lifecycle.
//!
//! `notes` uses the single-root engine and the stock enrichment. `lookup` and
//! `show` use the multi-vault engine and wrap the stock enrichment with their
//! own fields.

use crate::config::load_config;
use crate::engine::EngineCache;
use crate::engine_v2::MultiVaultEngine;
use crate::enrich::{default_enricher_v1, default_enricher_v2};
use crate::lifecycle::{EngineOptions, EnrichmentError, Execute, ExecutionError, Lifecycle};
use crate::options::{CliOptions, CommandOptions, CommandOptionsV2};
use crate::types::{EngineFamily, Note};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::Span;

/// Compact view of a note for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub fname: String,
    pub title: String,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            fname: note.fname.clone(),
            title: note.title.clone(),
            depth: note.depth(),
            updated: note.updated,
        }
    }
}

// --- notes ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct NotesReport {
    pub workspace_root: PathBuf,
    pub vault: PathBuf,
    pub notes: Vec<NoteSummary>,
}

pub struct NotesCommand;

impl Execute for NotesCommand {
    type Options = CommandOptions;
    type Output = NotesReport;

    async fn execute(&self, options: CommandOptions) -> Result<NotesReport, ExecutionError> {
        let notes = options.engine.notes()?;
        Ok(NotesReport {
            notes: notes.iter().map(NoteSummary::from).collect(),
            workspace_root: options.workspace_root,
            vault: options.vault,
        })
    }
}

pub fn notes_command(cache: EngineCache) -> Lifecycle<CliOptions, NotesCommand> {
    Lifecycle::new("notes", default_enricher_v1(cache), NotesCommand)
}

// --- lookup --------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    #[command(flatten)]
    pub common: CliOptions,

    /// Text to look up (fuzzy match on note name and title)
    pub query: String,

    /// Maximum number of results (defaults to lookup.limit in soil.yaml)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct LookupOptions {
    pub base: CommandOptionsV2,
    pub query: String,
    pub limit: usize,
}

impl EngineOptions for LookupOptions {
    type Engine = MultiVaultEngine;
    const FAMILY: EngineFamily = EngineFamily::V2;

    fn engine_mut(&mut self) -> &mut MultiVaultEngine {
        self.base.engine_mut()
    }
}

#[derive(Debug, Serialize)]
pub struct LookupReport {
    pub query: String,
    pub mode: String,
    pub total: usize,
    pub results: Vec<NoteSummary>,
}

pub struct LookupCommand;

impl Execute for LookupCommand {
    type Options = LookupOptions;
    type Output = LookupReport;

    async fn execute(&self, options: LookupOptions) -> Result<LookupReport, ExecutionError> {
        let engine = &options.base.engine;
        let matches = engine.query(&options.query)?;
        Ok(LookupReport {
            total: matches.len(),
            mode: engine.mode().to_string(),
            results: matches
                .into_iter()
                .take(options.limit)
                .map(NoteSummary::from)
                .collect(),
            query: options.query,
        })
    }
}

pub fn lookup_enricher(
    logger: Span,
) -> impl Fn(&LookupArgs) -> Result<LookupOptions, EnrichmentError> + Send + Sync + 'static {
    let base_enrich = default_enricher_v2(logger);
    move |args| {
        let base = base_enrich(&args.common)?;
        let limit = match args.limit {
            Some(limit) => limit,
            None => load_config(&base.workspace_root)?.lookup.limit,
        };
        if limit == 0 {
            return Err(EnrichmentError::Invalid(
                "lookup limit must be at least 1".to_string(),
            ));
        }
        Ok(LookupOptions {
            base,
            query: args.query.clone(),
            limit,
        })
    }
}

pub fn lookup_command(logger: Span) -> Lifecycle<LookupArgs, LookupCommand> {
    Lifecycle::new("lookup", lookup_enricher(logger), LookupCommand)
}

// --- show ----------------------------------------------------------------

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub common: CliOptions,

    /// Note name (e.g. proj.ideas)
    pub fname: String,
}

#[derive(Debug)]
pub struct ShowOptions {
    pub base: CommandOptionsV2,
    pub fname: String,
}

impl EngineOptions for ShowOptions {
    type Engine = MultiVaultEngine;
    const FAMILY: EngineFamily = EngineFamily::V2;

    fn engine_mut(&mut self) -> &mut MultiVaultEngine {
        self.base.engine_mut()
    }
}

pub struct ShowCommand;

impl Execute for ShowCommand {
    type Options = ShowOptions;
    type Output = Note;

    async fn execute(&self, options: ShowOptions) -> Result<Note, ExecutionError> {
        options
            .base
            .engine
            .get(&options.fname)?
            .cloned()
            .ok_or(ExecutionError::NoteNotFound(options.fname))
    }
}

pub fn show_enricher(
    logger: Span,
) -> impl Fn(&ShowArgs) -> Result<ShowOptions, EnrichmentError> + Send + Sync + 'static {
    let base_enrich = default_enricher_v2(logger);
    move |args| {
        let fname = args.fname.trim();
        let fname = fname.strip_suffix(".md").unwrap_or(fname);
        if fname.is_empty() {
            return Err(EnrichmentError::Invalid("note name is empty".to_string()));
        }
        Ok(ShowOptions {
            base: base_enrich(&args.common)?,
            fname: fname.to_string(),
        })
    }
}

pub fn show_command(logger: Span) -> Lifecycle<ShowArgs, ShowCommand> {
    Lifecycle::new("show", show_enricher(logger), ShowCommand)
}
