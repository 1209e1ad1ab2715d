//! Command lifecycle: enrich, initialize the engine, execute.
//!
//! A [`Lifecycle`] pairs an enrichment strategy (raw CLI options into enriched
//! options carrying a not-yet-initialized engine) with an [`Execute`]
//! implementation. [`Lifecycle::eval`] runs the phases in order and never
//! calls `execute` unless `init()` on the engine has succeeded.

use crate::config::ConfigError;
use crate::engine::{EngineError, EngineHandle};
use crate::options::build_args;
use crate::types::EngineFamily;
use std::fmt;
use std::future::Future;
use std::io;
use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};

/// Per-invocation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Enriched,
    EngineInitializing,
    Ready,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Enriched => "enriched",
            Phase::EngineInitializing => "engine_initializing",
            Phase::Ready => "ready",
            Phase::Executing => "executing",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Failed to read current directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    Failed(String),
}

/// Failure of one invocation, tagged with the phase that failed.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Enrichment failed: {0}")]
    Enrichment(#[source] EnrichmentError),
    #[error("Engine init failed: {0}")]
    EngineInit(#[source] EngineError),
    #[error("Execution failed: {0}")]
    Execution(#[source] ExecutionError),
}

impl LifecycleError {
    /// The phase the invocation was in when it failed.
    pub fn phase(&self) -> Phase {
        match self {
            LifecycleError::Enrichment(_) => Phase::Created,
            LifecycleError::EngineInit(_) => Phase::EngineInitializing,
            LifecycleError::Execution(_) => Phase::Executing,
        }
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::Enrichment(_) => "enrichment_error",
            LifecycleError::EngineInit(_) => "engine_init_error",
            LifecycleError::Execution(_) => "execution_error",
        }
    }
}

/// Enriched options that carry an engine of one family.
pub trait EngineOptions: Send {
    type Engine: EngineHandle;
    const FAMILY: EngineFamily;

    fn engine_mut(&mut self) -> &mut Self::Engine;
}

/// Command-specific business logic, run against an initialized engine.
pub trait Execute: Send + Sync {
    type Options: EngineOptions;
    type Output: Send;

    fn execute(
        &self,
        options: Self::Options,
    ) -> impl Future<Output = Result<Self::Output, ExecutionError>> + Send;
}

/// Enrichment strategy from CLI options `C` into enriched options `O`.
pub type Enricher<C, O> = Box<dyn Fn(&C) -> Result<O, EnrichmentError> + Send + Sync>;

pub struct Lifecycle<C, X: Execute> {
    name: &'static str,
    enrich: Enricher<C, X::Options>,
    command: X,
}

impl<C, X: Execute> Lifecycle<C, X> {
    pub fn new<F>(name: &'static str, enrich: F, command: X) -> Self
    where
        F: Fn(&C) -> Result<X::Options, EnrichmentError> + Send + Sync + 'static,
    {
        Self {
            name,
            enrich: Box::new(enrich),
            command,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn family(&self) -> EngineFamily {
        <X::Options as EngineOptions>::FAMILY
    }

    pub fn command(&self) -> &X {
        &self.command
    }

    /// Register the shared `--wsRoot` / `--vault` flags.
    pub fn build_args(&self, cmd: clap::Command) -> clap::Command {
        build_args(cmd)
    }

    /// Run the injected enrichment strategy.
    pub fn enrich_args(&self, cli: &C) -> Result<X::Options, EnrichmentError> {
        (self.enrich)(cli)
    }

    /// Enrich, await engine init, then execute. The first failing phase
    /// ends the invocation; nothing is retried.
    pub async fn eval(&self, cli: C) -> Result<X::Output, LifecycleError> {
        let span = info_span!("command", name = self.name, family = %self.family());
        async move {
            debug!(phase = %Phase::Created);
            let mut options = self.enrich_args(&cli).map_err(|e| {
                warn!(phase = %Phase::Failed, error = %e, "enrichment failed");
                LifecycleError::Enrichment(e)
            })?;
            drop(cli);
            debug!(phase = %Phase::Enriched);

            debug!(phase = %Phase::EngineInitializing);
            options.engine_mut().init().await.map_err(|e| {
                warn!(phase = %Phase::Failed, error = %e, "engine init failed");
                LifecycleError::EngineInit(e)
            })?;
            debug!(phase = %Phase::Ready);

            debug!(phase = %Phase::Executing);
            let output = self.command.execute(options).await.map_err(|e| {
                warn!(phase = %Phase::Failed, error = %e, "execution failed");
                LifecycleError::Execution(e)
            })?;
            debug!(phase = %Phase::Completed);
            Ok(output)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Events = Arc<Mutex<Vec<&'static str>>>;

    struct MockEngine {
        events: Events,
        inits: Arc<AtomicUsize>,
        fail_with: Option<&'static str>,
        ready: bool,
    }

    impl EngineHandle for MockEngine {
        async fn init(&mut self) -> Result<(), EngineError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.events.lock().unwrap().push("init");
            match self.fail_with {
                Some(reason) => Err(EngineError::Unavailable(reason.to_string())),
                None => {
                    self.ready = true;
                    Ok(())
                }
            }
        }
    }

    struct MockOptions {
        engine: MockEngine,
        label: String,
    }

    impl EngineOptions for MockOptions {
        type Engine = MockEngine;
        const FAMILY: EngineFamily = EngineFamily::V2;

        fn engine_mut(&mut self) -> &mut MockEngine {
            &mut self.engine
        }
    }

    struct RecordingCommand {
        events: Events,
        executions: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Execute for RecordingCommand {
        type Options = MockOptions;
        type Output = String;

        async fn execute(&self, options: MockOptions) -> Result<String, ExecutionError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("execute");
            assert!(options.engine.ready, "execute saw an engine before init");
            if self.fail {
                return Err(ExecutionError::Failed("boom".to_string()));
            }
            Ok(format!("done:{}", options.label))
        }
    }

    struct Harness {
        events: Events,
        inits: Arc<AtomicUsize>,
        constructed: Arc<AtomicUsize>,
        executions: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                events: Arc::default(),
                inits: Arc::default(),
                constructed: Arc::default(),
                executions: Arc::default(),
            }
        }

        fn lifecycle(
            &self,
            enrich_fails: bool,
            init_fails: Option<&'static str>,
            execute_fails: bool,
        ) -> Lifecycle<String, RecordingCommand> {
            let events = self.events.clone();
            let inits = self.inits.clone();
            let constructed = self.constructed.clone();
            let enrich = move |cli: &String| {
                if enrich_fails {
                    return Err(EnrichmentError::Invalid("missing field".to_string()));
                }
                constructed.fetch_add(1, Ordering::SeqCst);
                events.lock().unwrap().push("enrich");
                Ok(MockOptions {
                    engine: MockEngine {
                        events: events.clone(),
                        inits: inits.clone(),
                        fail_with: init_fails,
                        ready: false,
                    },
                    label: cli.clone(),
                })
            };
            let command = RecordingCommand {
                events: self.events.clone(),
                executions: self.executions.clone(),
                fail: execute_fails,
            };
            Lifecycle::new("mock", enrich, command)
        }
    }

    #[tokio::test]
    async fn test_eval_runs_phases_in_order() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(false, None, false);

        let output = lifecycle.eval("ok".to_string()).await.unwrap();

        assert_eq!(output, "done:ok");
        assert_eq!(*h.events.lock().unwrap(), vec!["enrich", "init", "execute"]);
        assert_eq!(h.inits.load(Ordering::SeqCst), 1);
        assert_eq!(h.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_enrichment_error_stops_before_engine() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(true, None, false);

        let err = lifecycle.eval("x".to_string()).await.unwrap_err();

        assert!(matches!(
            &err,
            LifecycleError::Enrichment(EnrichmentError::Invalid(msg)) if msg == "missing field"
        ));
        assert_eq!(err.phase(), Phase::Created);
        assert_eq!(h.constructed.load(Ordering::SeqCst), 0);
        assert_eq!(h.inits.load(Ordering::SeqCst), 0);
        assert_eq!(h.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_init_failure_skips_execute() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(false, Some("lock held"), false);

        let err = lifecycle.eval("x".to_string()).await.unwrap_err();

        assert!(matches!(
            &err,
            LifecycleError::EngineInit(EngineError::Unavailable(msg)) if msg == "lock held"
        ));
        assert_eq!(err.phase(), Phase::EngineInitializing);
        assert_eq!(err.code(), "engine_init_error");
        assert_eq!(h.inits.load(Ordering::SeqCst), 1);
        assert_eq!(h.executions.load(Ordering::SeqCst), 0);
        assert_eq!(*h.events.lock().unwrap(), vec!["enrich", "init"]);
    }

    #[tokio::test]
    async fn test_execution_error_is_propagated() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(false, None, true);

        let err = lifecycle.eval("x".to_string()).await.unwrap_err();

        assert!(matches!(
            &err,
            LifecycleError::Execution(ExecutionError::Failed(msg)) if msg == "boom"
        ));
        assert_eq!(err.phase(), Phase::Executing);
        assert_eq!(h.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_eval_enriches_a_fresh_engine() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(false, None, false);

        lifecycle.eval("a".to_string()).await.unwrap();
        lifecycle.eval("b".to_string()).await.unwrap();

        assert_eq!(h.constructed.load(Ordering::SeqCst), 2);
        assert_eq!(h.inits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_family_comes_from_options_type() {
        let h = Harness::new();
        let lifecycle = h.lifecycle(false, None, false);
        assert_eq!(lifecycle.family(), EngineFamily::V2);
        assert_eq!(lifecycle.name(), "mock");
    }

    #[test]
    fn test_build_args_registers_shared_flags() {
        let h = Harness::new();
        let cmd = h.lifecycle(false, None, false).build_args(clap::Command::new("mock"));
        let ids: Vec<_> = cmd.get_arguments().map(|a| a.get_id().to_string()).collect();
        assert!(ids.contains(&"ws_root".to_string()));
        assert!(ids.contains(&"vault".to_string()));
    }
}
