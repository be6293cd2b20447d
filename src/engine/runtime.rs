// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RawConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::scan::ParseBackend;
use crate::special::UsageStore;
use crate::tree::DeltaSink;
use crate::types::FsEventKind;
use crate::watch::discover;

use super::core::CoreExplorer;
use super::{CoreCommand, DiscoverRequest, ExplorerEvent};

/// Drives the core explorer in response to `ExplorerEvent`s, and delegates
/// parsing to a `ParseBackend`.
///
/// This is a pure IO shell around `CoreExplorer`, which contains all the
/// synchronization semantics. This struct handles async IO: reading events
/// from channels, firing coalescer deadlines, walking directories, and
/// persisting usage.
pub struct Runtime<B: ParseBackend> {
    core: CoreExplorer,
    event_rx: mpsc::Receiver<ExplorerEvent>,
    backend: B,
    fs: Arc<dyn FileSystem>,
    usage_store: Box<dyn UsageStore>,
    sink: Box<dyn DeltaSink>,
    /// Edits to this file are reloaded as `ConfigUpdated`.
    config_path: Option<PathBuf>,
}

impl<B: ParseBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: ParseBackend> Runtime<B> {
    pub fn new(
        core: CoreExplorer,
        event_rx: mpsc::Receiver<ExplorerEvent>,
        backend: B,
        fs: Arc<dyn FileSystem>,
        usage_store: Box<dyn UsageStore>,
        sink: Box<dyn DeltaSink>,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            fs,
            usage_store,
            sink,
            config_path: None,
        }
    }

    /// Reload the configuration whenever `path` changes on disk.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Main event loop.
    ///
    /// - Starts the initial scan.
    /// - Consumes `ExplorerEvent`s from `event_rx`, plus a `Tick` whenever
    ///   the earliest coalescer deadline elapses.
    /// - Executes commands returned by the core.
    ///
    /// Returns the core so callers can inspect the final tree.
    pub async fn run(mut self) -> Result<CoreExplorer> {
        info!(roots = ?self.core.roots(), "task explorer runtime started");

        // Follow-up events produced by the shell itself (discovery results).
        let mut local: VecDeque<ExplorerEvent> = VecDeque::new();

        let step = self.core.start(Instant::now());
        self.execute_all(step.commands, &mut local).await?;
        let mut keep_running = step.keep_running;

        while keep_running {
            let event = match local.pop_front() {
                Some(event) => event,
                None => {
                    let deadline = self.core.next_deadline();
                    tokio::select! {
                        received = self.event_rx.recv() => match received {
                            Some(event) => event,
                            None => {
                                info!("runtime event channel closed; exiting");
                                break;
                            }
                        },
                        _ = sleep_until(deadline) => ExplorerEvent::Tick,
                    }
                }
            };

            let Some(event) = self.intercept_config(event) else {
                continue;
            };
            debug!(?event, "runtime received event");

            let step = self.core.step(event, Instant::now());
            self.execute_all(step.commands, &mut local).await?;

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                keep_running = false;
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    async fn execute_all(
        &mut self,
        commands: Vec<CoreCommand>,
        local: &mut VecDeque<ExplorerEvent>,
    ) -> Result<()> {
        for command in commands {
            self.execute_command(command, local).await?;
        }
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(
        &mut self,
        command: CoreCommand,
        local: &mut VecDeque<ExplorerEvent>,
    ) -> Result<()> {
        match command {
            CoreCommand::Discover(request) => {
                local.push_back(self.run_discovery(request));
            }
            CoreCommand::Parse(request) => {
                debug!(scope = ?request.scope, jobs = request.jobs.len(), "submitting parse");
                self.backend.submit(request).await?;
            }
            CoreCommand::CancelParse(scope) => {
                self.backend.cancel(&scope);
            }
            CoreCommand::Publish(delta) => {
                self.sink.publish(&delta);
            }
            CoreCommand::SaveUsage(snapshot) => {
                if let Err(err) = self.usage_store.save(&snapshot) {
                    warn!(error = %err, "failed to persist usage");
                }
            }
            CoreCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    /// Turn a change of the config file into `ConfigUpdated`. A file that
    /// fails to read or deserialise is dropped; the core keeps its settings.
    fn intercept_config(&self, event: ExplorerEvent) -> Option<ExplorerEvent> {
        let is_config_write = match (&event, &self.config_path) {
            (ExplorerEvent::Fs(raw), Some(path)) => {
                raw.path == *path && raw.kind != FsEventKind::Remove
            }
            _ => false,
        };
        if !is_config_write {
            return Some(event);
        }
        let config_path = self.config_path.as_ref()?;

        let text = match self.fs.read_to_string(config_path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = ?config_path, error = %err, "failed to read config file");
                return None;
            }
        };
        match toml::from_str::<RawConfigFile>(&text) {
            Ok(raw_config) => {
                info!(path = ?config_path, "config file changed; reloading");
                Some(ExplorerEvent::ConfigUpdated(raw_config))
            }
            Err(err) => {
                warn!(path = ?config_path, error = %err, "ignoring unparsable config file");
                None
            }
        }
    }

    fn run_discovery(&self, request: DiscoverRequest) -> ExplorerEvent {
        let files = match discover(
            self.fs.as_ref(),
            self.core.registry(),
            self.core.filter(),
            &request.project,
            &request.scope,
            &request.formats,
        ) {
            Ok(files) => files,
            Err(err) => {
                warn!(scope = ?request.scope, error = %err, "discovery failed");
                return ExplorerEvent::DiscoveryFailed {
                    scope: request.scope,
                    generation: request.generation,
                    message: format!("{err:#}"),
                };
            }
        };
        ExplorerEvent::Discovered {
            scope: request.scope,
            project: request.project,
            generation: request.generation,
            formats: request.formats,
            files,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending::<()>().await,
    }
}
