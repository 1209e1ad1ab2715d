//! Default enrichment strategies for the two engine families.
//!
//! Commands that need more than path resolution and engine construction wrap
//! one of the `default_enricher_*` closures and extend its result.

use crate::engine::{EngineCache, VaultEngineConfig};
use crate::engine_v2::{EngineConfigV2, MultiVaultEngine};
use crate::lifecycle::EnrichmentError;
use crate::options::{CliOptions, CommandOptions, CommandOptionsV2};
use crate::paths::resolve_path;
use crate::storage::FileStorage;
use crate::types::LookupMode;
use std::env;
use std::path::{Path, PathBuf};
use tracing::Span;

pub fn current_dir() -> Result<PathBuf, EnrichmentError> {
    env::current_dir().map_err(EnrichmentError::CurrentDir)
}

/// v1: resolve both paths against `cwd` and take a forced-fresh engine for
/// the vault root from `cache`.
pub fn default_enrich_v1(cli: &CliOptions, cwd: &Path, cache: &EngineCache) -> CommandOptions {
    let workspace_root = resolve_path(&cli.ws_root, cwd);
    let vault = resolve_path(&cli.vault, cwd);
    let engine = cache.get_or_create(VaultEngineConfig {
        root: vault.clone(),
        force_new: true,
    });
    CommandOptions {
        engine,
        engine_client: None,
        workspace_root,
        vault,
    }
}

pub fn default_enricher_v1(
    cache: EngineCache,
) -> impl Fn(&CliOptions) -> Result<CommandOptions, EnrichmentError> + Send + Sync + 'static {
    move |cli| Ok(default_enrich_v1(cli, &current_dir()?, &cache))
}

/// v2: resolve both paths against `cwd` and construct a new multi-vault
/// engine over the single resolved vault, in fuzzy mode. `logger` is handed
/// to both the engine and its storage.
pub fn default_enrich_v2(cli: &CliOptions, cwd: &Path, logger: &Span) -> CommandOptionsV2 {
    let workspace_root = resolve_path(&cli.ws_root, cwd);
    let vault = resolve_path(&cli.vault, cwd);
    let vaults = vec![vault.clone()];
    let engine = MultiVaultEngine::new(EngineConfigV2 {
        store: FileStorage::new(vaults.clone(), logger.clone()),
        vaults,
        force_new: true,
        mode: LookupMode::Fuzzy,
        logger: logger.clone(),
    });
    CommandOptionsV2 {
        engine,
        workspace_root,
        vault,
    }
}

pub fn default_enricher_v2(
    logger: Span,
) -> impl Fn(&CliOptions) -> Result<CommandOptionsV2, EnrichmentError> + Send + Sync + 'static {
    move |cli| Ok(default_enrich_v2(cli, &current_dir()?, &logger))
}
