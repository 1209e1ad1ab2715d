//! Soil - command lifecycle for vault-backed note workspaces.
//!
//! A command turns raw `--wsRoot` / `--vault` options into enriched options
//! holding a fresh engine, waits for that engine's `init()`, and only then
//! runs its own logic. Two engine families exist: a single-root engine (v1)
//! and a multi-vault engine with a storage backend (v2).

pub mod commands;
pub mod config;
pub mod engine;
pub mod engine_v2;
pub mod enrich;
pub mod fuzzy;
pub mod lifecycle;
pub mod options;
pub mod paths;
pub mod storage;
pub mod types;

pub use commands::{
    LookupArgs, LookupCommand, LookupReport, NoteSummary, NotesCommand, NotesReport, ShowArgs,
    ShowCommand, lookup_command, notes_command, show_command,
};
pub use config::{CONFIG_FILE, ConfigError, WorkspaceConfig, load_config};
pub use engine::{EngineCache, EngineError, EngineHandle, VaultEngine, VaultEngineConfig};
pub use engine_v2::{EngineConfigV2, MultiVaultEngine};
pub use enrich::{default_enrich_v1, default_enrich_v2, default_enricher_v1, default_enricher_v2};
pub use lifecycle::{
    EngineOptions, Enricher, EnrichmentError, Execute, ExecutionError, Lifecycle, LifecycleError,
    Phase,
};
pub use options::{CliOptions, CommandOptions, CommandOptionsV2, build_args};
pub use paths::resolve_path;
pub use storage::{FileStorage, StorageError};
pub use types::{EngineFamily, LookupMode, Note};
