//! Option shapes exchanged between lifecycle phases.

use crate::engine::VaultEngine;
use crate::engine_v2::MultiVaultEngine;
use crate::lifecycle::EngineOptions;
use crate::types::EngineFamily;
use clap::Args;
use std::path::PathBuf;

/// Raw, user-supplied options shared by every command. Paths may be relative.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Location of workspace
    #[arg(long = "wsRoot", value_name = "PATH")]
    pub ws_root: PathBuf,

    /// Location of vault
    #[arg(long, value_name = "PATH")]
    pub vault: PathBuf,
}

/// Register the required `--wsRoot` and `--vault` flags on a clap command.
pub fn build_args(cmd: clap::Command) -> clap::Command {
    CliOptions::augment_args(cmd)
}

/// Enriched options for the single-root (v1) engine family.
#[derive(Debug)]
pub struct CommandOptions {
    pub engine: VaultEngine,
    pub engine_client: Option<MultiVaultEngine>,
    pub workspace_root: PathBuf,
    pub vault: PathBuf,
}

impl EngineOptions for CommandOptions {
    type Engine = VaultEngine;
    const FAMILY: EngineFamily = EngineFamily::V1;

    fn engine_mut(&mut self) -> &mut VaultEngine {
        &mut self.engine
    }
}

/// Enriched options for the multi-vault (v2) engine family.
#[derive(Debug)]
pub struct CommandOptionsV2 {
    pub engine: MultiVaultEngine,
    pub workspace_root: PathBuf,
    pub vault: PathBuf,
}

impl EngineOptions for CommandOptionsV2 {
    type Engine = MultiVaultEngine;
    const FAMILY: EngineFamily = EngineFamily::V2;

    fn engine_mut(&mut self) -> &mut MultiVaultEngine {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::FromArgMatches;

    fn parse(args: &[&str]) -> Result<CliOptions, clap::Error> {
        let cmd = build_args(clap::Command::new("test"));
        let matches = cmd.try_get_matches_from(args)?;
        CliOptions::from_arg_matches(&matches)
    }

    #[test]
    fn test_build_args_parses_both_flags() {
        let options = parse(&["test", "--wsRoot", "./ws", "--vault", "./ws/vault"]).unwrap();
        assert_eq!(options.ws_root, PathBuf::from("./ws"));
        assert_eq!(options.vault, PathBuf::from("./ws/vault"));
    }

    #[test]
    fn test_missing_ws_root_is_rejected() {
        let err = parse(&["test", "--vault", "v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_missing_vault_is_rejected() {
        let err = parse(&["test", "--wsRoot", "ws"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
