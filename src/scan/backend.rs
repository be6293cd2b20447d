// src/scan/backend.rs

//! Pluggable parse backend abstraction.
//!
//! The runtime talks to a `ParseBackend` instead of spawning work itself.
//! This makes it easy to swap in a synchronous fake in tests while keeping
//! the production implementation here.
//!
//! - `RealParseBackend` spawns one tokio task per request and keeps its
//!   abort handle per scope, so a superseded pass can be abandoned.
//! - Tests can provide their own `ParseBackend` that parses inline and
//!   emits `ExplorerEvent::Parsed` directly.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::engine::ExplorerEvent;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::parse::ParserRegistry;
use crate::scan::{FileResult, ParseBatch, ParseRequest, run_job};

/// Trait abstracting how parse requests are executed.
pub trait ParseBackend: Send {
    /// Start the request. The result arrives later as `ExplorerEvent::Parsed`.
    fn submit(
        &mut self,
        request: ParseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Best-effort abort of the in-flight request for `scope`.
    fn cancel(&mut self, scope: &Path);
}

/// Real backend used in production.
pub struct RealParseBackend {
    registry: Arc<ParserRegistry>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<ExplorerEvent>,
    running: HashMap<PathBuf, AbortHandle>,
}

impl RealParseBackend {
    pub fn new(
        registry: Arc<ParserRegistry>,
        fs: Arc<dyn FileSystem>,
        runtime_tx: mpsc::Sender<ExplorerEvent>,
    ) -> Self {
        Self {
            registry,
            fs,
            runtime_tx,
            running: HashMap::new(),
        }
    }
}

impl ParseBackend for RealParseBackend {
    fn submit(
        &mut self,
        request: ParseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.running.retain(|_, handle| !handle.is_finished());

        let registry = Arc::clone(&self.registry);
        let fs = Arc::clone(&self.fs);
        let tx = self.runtime_tx.clone();
        let scope = request.scope.clone();

        let handle = tokio::spawn(async move {
            let mut results = Vec::with_capacity(request.jobs.len());
            for job in &request.jobs {
                let outcome = run_job(&registry, fs.as_ref(), job).await;
                results.push(FileResult {
                    key: job.key.clone(),
                    project: job.project.clone(),
                    outcome,
                });
            }
            let batch = ParseBatch {
                scope: request.scope,
                generation: request.generation,
                results,
            };
            if tx.send(ExplorerEvent::Parsed(batch)).await.is_err() {
                debug!("runtime channel closed before parse result was delivered");
            }
        });

        if let Some(previous) = self.running.insert(scope, handle.abort_handle()) {
            previous.abort();
        }

        Box::pin(async { Ok(()) })
    }

    fn cancel(&mut self, scope: &Path) {
        if let Some(handle) = self.running.remove(scope) {
            debug!(?scope, "aborting superseded parse");
            handle.abort();
        }
    }
}
