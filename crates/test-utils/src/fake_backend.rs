use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use taskexplorer::engine::ExplorerEvent;
use taskexplorer::errors::Result;
use taskexplorer::fs::FileSystem;
use taskexplorer::parse::ParserRegistry;
use taskexplorer::scan::{FileResult, ParseBackend, ParseBatch, ParseRequest, parse_job};
use taskexplorer::tree::{DeltaSink, ExplorerDelta};

/// A fake parse backend that:
/// - records the scope of every submitted request
/// - parses the jobs inline (static parsers only, no tool processes)
/// - reports the batch back through the runtime channel.
pub struct FakeParseBackend {
    registry: Arc<ParserRegistry>,
    fs: Arc<dyn FileSystem>,
    runtime_tx: mpsc::Sender<ExplorerEvent>,
    submitted: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeParseBackend {
    pub fn new(
        registry: Arc<ParserRegistry>,
        fs: Arc<dyn FileSystem>,
        runtime_tx: mpsc::Sender<ExplorerEvent>,
        submitted: Arc<Mutex<Vec<PathBuf>>>,
    ) -> Self {
        Self {
            registry,
            fs,
            runtime_tx,
            submitted,
        }
    }
}

impl ParseBackend for FakeParseBackend {
    fn submit(
        &mut self,
        request: ParseRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let registry = Arc::clone(&self.registry);
        let fs = Arc::clone(&self.fs);
        let submitted = Arc::clone(&self.submitted);

        Box::pin(async move {
            {
                let mut guard = submitted.lock().unwrap();
                guard.push(request.scope.clone());
            }

            let results = request
                .jobs
                .iter()
                .map(|job| FileResult {
                    key: job.key.clone(),
                    project: job.project.clone(),
                    outcome: parse_job(&registry, fs.as_ref(), job),
                })
                .collect();

            tx.send(ExplorerEvent::Parsed(ParseBatch {
                scope: request.scope,
                generation: request.generation,
                results,
            }))
            .await
            .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }

    fn cancel(&mut self, _scope: &Path) {}
}

/// Sink that keeps every published delta for later inspection.
#[derive(Clone, Default)]
pub struct RecordingSink {
    deltas: Arc<Mutex<Vec<ExplorerDelta>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deltas(&self) -> Vec<ExplorerDelta> {
        self.deltas.lock().unwrap().clone()
    }
}

impl DeltaSink for RecordingSink {
    fn publish(&mut self, delta: &ExplorerDelta) {
        self.deltas.lock().unwrap().push(delta.clone());
    }
}
