//! Multi-vault (v2) engine.

use crate::engine::{EngineError, EngineHandle, exact_matches, next_instance_id};
use crate::fuzzy;
use crate::storage::FileStorage;
use crate::types::{LookupMode, Note};
use std::path::PathBuf;
use tracing::{Span, info};

/// Construction parameters for [`MultiVaultEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfigV2 {
    pub vaults: Vec<PathBuf>,
    pub force_new: bool,
    pub store: FileStorage,
    pub mode: LookupMode,
    pub logger: Span,
}

/// Engine over a list of vaults, loading through a pluggable storage backend.
/// Never cached: every call to [`MultiVaultEngine::new`] is a new instance.
#[derive(Debug)]
pub struct MultiVaultEngine {
    vaults: Vec<PathBuf>,
    force_new: bool,
    store: FileStorage,
    mode: LookupMode,
    logger: Span,
    instance_id: u64,
    notes: Option<Vec<Note>>,
}

impl MultiVaultEngine {
    pub fn new(config: EngineConfigV2) -> Self {
        Self {
            vaults: config.vaults,
            force_new: config.force_new,
            store: config.store,
            mode: config.mode,
            logger: config.logger,
            instance_id: next_instance_id(),
            notes: None,
        }
    }

    pub fn vaults(&self) -> &[PathBuf] {
        &self.vaults
    }

    pub fn force_new(&self) -> bool {
        self.force_new
    }

    pub fn store(&self) -> &FileStorage {
        &self.store
    }

    pub fn mode(&self) -> LookupMode {
        self.mode
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn is_initialized(&self) -> bool {
        self.notes.is_some()
    }

    pub fn notes(&self) -> Result<&[Note], EngineError> {
        self.notes.as_deref().ok_or(EngineError::NotInitialized)
    }

    /// First note with this fname, searching vaults in order.
    pub fn get(&self, fname: &str) -> Result<Option<&Note>, EngineError> {
        Ok(self.notes()?.iter().find(|n| n.fname == fname))
    }

    /// Look up notes in the engine's mode. Fuzzy results are ranked best
    /// first (ties by fname); exact results keep storage order.
    pub fn query(&self, text: &str) -> Result<Vec<&Note>, EngineError> {
        let notes = self.notes()?;
        match self.mode {
            LookupMode::Exact => Ok(exact_matches(notes, text)),
            LookupMode::Fuzzy => {
                let mut scored: Vec<(i64, &Note)> = notes
                    .iter()
                    .filter_map(|note| {
                        let by_fname = fuzzy::score(text, &note.fname);
                        let by_title = fuzzy::score(text, &note.title);
                        by_fname.max(by_title).map(|s| (s, note))
                    })
                    .collect();
                scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.fname.cmp(&b.fname)));
                Ok(scored.into_iter().map(|(_, note)| note).collect())
            }
        }
    }
}

impl EngineHandle for MultiVaultEngine {
    async fn init(&mut self) -> Result<(), EngineError> {
        if self.vaults.is_empty() || self.store.vaults().is_empty() {
            return Err(EngineError::Unavailable("no vaults configured".to_string()));
        }
        let store = self.store.clone();
        let notes = tokio::task::spawn_blocking(move || store.load_all()).await??;
        self.logger.in_scope(|| {
            info!(
                vaults = self.vaults.len(),
                instance = self.instance_id,
                mode = %self.mode,
                notes = notes.len(),
                "multi-vault engine ready"
            )
        });
        self.notes = Some(notes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::fs;
    use tempfile::TempDir;

    fn engine_for(vaults: Vec<PathBuf>, mode: LookupMode) -> MultiVaultEngine {
        let logger = Span::none();
        MultiVaultEngine::new(EngineConfigV2 {
            store: FileStorage::new(vaults.clone(), logger.clone()),
            vaults,
            force_new: true,
            mode,
            logger,
        })
    }

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("proj.md"), "").unwrap();
        fs::write(dir.path().join("proj.ideas.md"), "").unwrap();
        fs::write(dir.path().join("daily.journal.md"), "---\ntitle: Journal\n---\n").unwrap();
        dir
    }

    #[test]
    fn test_query_before_init_is_rejected() {
        let engine = engine_for(vec![PathBuf::from("/v")], LookupMode::Fuzzy);
        assert!(matches!(engine.query("x"), Err(EngineError::NotInitialized)));
        assert!(matches!(engine.get("x"), Err(EngineError::NotInitialized)));
    }

    #[test]
    fn test_each_construction_is_a_new_instance() {
        let a = engine_for(vec![PathBuf::from("/v")], LookupMode::Fuzzy);
        let b = engine_for(vec![PathBuf::from("/v")], LookupMode::Fuzzy);
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[tokio::test]
    async fn test_fuzzy_query_ranks_best_first() {
        let dir = vault();
        let mut engine = engine_for(vec![dir.path().to_path_buf()], LookupMode::Fuzzy);
        engine.init().await.unwrap();

        let hits: Vec<_> = engine
            .query("ideas")
            .unwrap()
            .into_iter()
            .map(|n| n.fname.as_str())
            .collect();
        assert_eq!(hits.first(), Some(&"proj.ideas"));

        let journal: Vec<_> = engine.query("jrnl").unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].fname, "daily.journal");
    }

    #[tokio::test]
    async fn test_exact_query_is_substring() {
        let dir = vault();
        let mut engine = engine_for(vec![dir.path().to_path_buf()], LookupMode::Exact);
        engine.init().await.unwrap();

        assert!(engine.query("jrnl").unwrap().is_empty());
        assert_eq!(engine.query("proj").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_init_without_vaults_is_unavailable() {
        let mut engine = engine_for(Vec::new(), LookupMode::Fuzzy);

        let err = engine.init().await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert!(!engine.is_initialized());
    }

    #[tokio::test]
    async fn test_init_propagates_storage_errors() {
        let dir = TempDir::new().unwrap();
        let mut engine = engine_for(vec![dir.path().join("missing")], LookupMode::Fuzzy);

        let err = engine.init().await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Storage(StorageError::VaultNotFound(_))
        ));
        assert!(!engine.is_initialized());
    }
}
