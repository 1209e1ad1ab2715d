//! Core types shared by engines, storage and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A note loaded from a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    /// Hierarchical file name without extension, e.g. `proj.ideas`.
    pub fname: String,
    pub title: String,
    pub vault: PathBuf,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Note {
    /// Depth in the dotted hierarchy (`root` is 0, `a.b` is 1).
    pub fn depth(&self) -> usize {
        self.fname.matches('.').count()
    }
}

/// How engine lookups match a query against notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    #[default]
    Exact,
    Fuzzy,
}

impl fmt::Display for LookupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMode::Exact => write!(f, "exact"),
            LookupMode::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// The two incompatible option/engine families a command can be built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineFamily {
    /// Single-root engine bound to one vault.
    V1,
    /// Multi-vault engine with a pluggable storage backend.
    V2,
}

impl fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFamily::V1 => write!(f, "v1"),
            EngineFamily::V2 => write!(f, "v2"),
        }
    }
}
