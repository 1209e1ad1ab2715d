//! Engine capability and the single-root (v1) engine.
//!
//! Every engine sits behind an `init()` readiness gate: domain operations
//! return [`EngineError::NotInitialized`] until `init()` has succeeded.

use crate::storage::{FileStorage, StorageError};
use crate::types::Note;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{Span, debug, info};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Engine used before init() completed")]
    NotInitialized,
    #[error("Engine task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Unavailable(String),
}

/// What the command lifecycle needs from an engine.
pub trait EngineHandle: Send {
    /// Bring the engine to a ready state. Called once per invocation, before
    /// any command logic runs.
    fn init(&mut self) -> impl Future<Output = Result<(), EngineError>> + Send;
}

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for a freshly constructed engine.
pub(crate) fn next_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Case-insensitive substring match on fname, in input order.
pub(crate) fn exact_matches<'a>(notes: &'a [Note], text: &str) -> Vec<&'a Note> {
    let needle = text.to_lowercase();
    notes
        .iter()
        .filter(|n| n.fname.to_lowercase().contains(&needle))
        .collect()
}

/// Construction parameters for [`VaultEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEngineConfig {
    pub root: PathBuf,
    pub force_new: bool,
}

/// Single-root engine bound to one vault.
///
/// Clones share state, so a clone handed out by [`EngineCache`] is the same
/// engine instance, not a copy.
#[derive(Debug, Clone)]
pub struct VaultEngine {
    root: PathBuf,
    instance_id: u64,
    notes: Arc<RwLock<Option<Vec<Note>>>>,
}

impl VaultEngine {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            instance_id: next_instance_id(),
            notes: Arc::new(RwLock::new(None)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn is_initialized(&self) -> bool {
        self.read(|_| ()).is_ok()
    }

    /// All notes, sorted by fname.
    pub fn notes(&self) -> Result<Vec<Note>, EngineError> {
        self.read(|notes| notes.to_vec())
    }

    pub fn get(&self, fname: &str) -> Result<Option<Note>, EngineError> {
        self.read(|notes| notes.iter().find(|n| n.fname == fname).cloned())
    }

    pub fn query(&self, text: &str) -> Result<Vec<Note>, EngineError> {
        self.read(|notes| exact_matches(notes, text).into_iter().cloned().collect())
    }

    fn read<T>(&self, f: impl FnOnce(&[Note]) -> T) -> Result<T, EngineError> {
        let guard = self.notes.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_deref().map(f).ok_or(EngineError::NotInitialized)
    }
}

impl EngineHandle for VaultEngine {
    async fn init(&mut self) -> Result<(), EngineError> {
        let store = FileStorage::new(vec![self.root.clone()], Span::current());
        let notes = tokio::task::spawn_blocking(move || store.load_all()).await??;
        info!(
            root = %self.root.display(),
            instance = self.instance_id,
            notes = notes.len(),
            "vault engine ready"
        );
        *self.notes.write().unwrap_or_else(PoisonError::into_inner) = Some(notes);
        Ok(())
    }
}

/// Explicit get-or-create cache of [`VaultEngine`]s keyed by vault root.
///
/// Pass a handle to whatever needs it; tests build a fresh one each.
#[derive(Debug, Clone, Default)]
pub struct EngineCache {
    engines: Arc<Mutex<HashMap<PathBuf, VaultEngine>>>,
}

impl EngineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// With `force_new` the cache is never consulted: a fresh engine is built
    /// and recorded for the root. Otherwise a cached engine for the root is
    /// returned when one exists.
    pub fn get_or_create(&self, config: VaultEngineConfig) -> VaultEngine {
        let mut engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        if !config.force_new
            && let Some(engine) = engines.get(&config.root)
        {
            debug!(root = %config.root.display(), instance = engine.instance_id, "reusing cached engine");
            return engine.clone();
        }

        let engine = VaultEngine::new(config.root.clone());
        debug!(root = %config.root.display(), instance = engine.instance_id, "created engine");
        engines.insert(config.root, engine.clone());
        engine
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
