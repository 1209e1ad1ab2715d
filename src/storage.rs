//! File-based storage for vault notes.
//!
//! A vault is a flat directory of Markdown files whose dotted names encode the
//! hierarchy (`proj.ideas.md` is the note `proj.ideas`). Each file may start
//! with a YAML frontmatter block.

use crate::types::Note;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{Span, debug, warn};
use walkdir::WalkDir;

pub const NOTE_EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Vault not found: {0}")]
    VaultNotFound(PathBuf),
    #[error("Invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Duplicate note id '{id}': {first} and {second}")]
    DuplicateNote {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },
}

#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    id: Option<String>,
    title: Option<String>,
    /// Epoch milliseconds.
    updated: Option<i64>,
}

/// Storage backend scoped to a list of vaults.
#[derive(Debug, Clone)]
pub struct FileStorage {
    vaults: Vec<PathBuf>,
    logger: Span,
}

impl FileStorage {
    pub fn new(vaults: Vec<PathBuf>, logger: Span) -> Self {
        Self { vaults, logger }
    }

    pub fn vaults(&self) -> &[PathBuf] {
        &self.vaults
    }

    /// Load every note from every vault, rejecting duplicate ids across vaults.
    pub fn load_all(&self) -> Result<Vec<Note>, StorageError> {
        let _entered = self.logger.enter();
        let mut notes = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for vault in &self.vaults {
            let loaded = load_vault(vault)?;
            debug!(vault = %vault.display(), count = loaded.len(), "loaded vault");
            for note in loaded {
                if let Some(first) = seen.get(&note.id) {
                    return Err(StorageError::DuplicateNote {
                        id: note.id,
                        first: first.clone(),
                        second: note.path,
                    });
                }
                seen.insert(note.id.clone(), note.path.clone());
                notes.push(note);
            }
        }

        Ok(notes)
    }
}

/// Load all notes from a single vault directory, sorted by fname.
pub fn load_vault(vault: &Path) -> Result<Vec<Note>, StorageError> {
    if !vault.is_dir() {
        return Err(StorageError::VaultNotFound(vault.to_path_buf()));
    }

    let mut notes = Vec::new();
    for entry in WalkDir::new(vault).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_note_file(path) {
            continue;
        }
        let content = fs::read_to_string(path)?;
        let mut note = parse_note(vault, path, &content)?;
        if note.updated.is_none() {
            note.updated = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);
        }
        notes.push(note);
    }

    notes.sort_by(|a, b| a.fname.cmp(&b.fname));
    Ok(notes)
}

fn is_note_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    !hidden && path.extension().and_then(|e| e.to_str()) == Some(NOTE_EXTENSION)
}

/// Parse a note file. The fname comes from the file stem; id and title fall
/// back to the fname and its last hierarchy segment.
pub fn parse_note(vault: &Path, path: &Path, content: &str) -> Result<Note, StorageError> {
    let fname = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let (yaml, body) = split_frontmatter(content);
    let meta: Frontmatter = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => {
            serde_yaml::from_str(yaml).map_err(|source| StorageError::Frontmatter {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => Frontmatter::default(),
    };

    let updated = meta.updated.and_then(|ms| {
        let parsed = DateTime::<Utc>::from_timestamp_millis(ms);
        if parsed.is_none() {
            warn!(path = %path.display(), updated = ms, "ignoring out-of-range timestamp");
        }
        parsed
    });

    Ok(Note {
        id: meta.id.unwrap_or_else(|| fname.clone()),
        title: meta.title.unwrap_or_else(|| default_title(&fname)),
        fname,
        vault: vault.to_path_buf(),
        path: path.to_path_buf(),
        body: body.to_string(),
        updated,
    })
}

fn default_title(fname: &str) -> String {
    let last = fname.rsplit('.').next().unwrap_or(fname);
    let mut chars = last.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split a leading `---` delimited block off the content.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let rest = match content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None => return (None, content),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return (Some(yaml), body);
        }
        offset += line.len();
    }

    // Unterminated block: treat the whole thing as body.
    (None, content)
}
