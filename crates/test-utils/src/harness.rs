#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use taskexplorer::config::ConfigFile;
use taskexplorer::engine::{CoreCommand, CoreExplorer, CoreStep, ExplorerEvent, RuntimeOptions};
use taskexplorer::fs::FileSystem;
use taskexplorer::fs::mock::MockFileSystem;
use taskexplorer::parse::ParserRegistry;
use taskexplorer::scan::{FileResult, ParseBatch, ParseRequest, parse_job};
use taskexplorer::special::UsageSnapshot;
use taskexplorer::task::TreeId;
use taskexplorer::tree::ExplorerDelta;
use taskexplorer::types::{FsEventKind, TaskFormat};
use taskexplorer::watch::{RawFsEvent, discover};

/// Drives a `CoreExplorer` synchronously against a `MockFileSystem`.
///
/// Discover and parse commands are executed inline; the clock only moves
/// when a test calls `advance` or `settle`.
pub struct CoreHarness {
    pub core: CoreExplorer,
    pub fs: MockFileSystem,
    pub now: Instant,
    pub deltas: Vec<ExplorerDelta>,
    pub saved: Vec<UsageSnapshot>,
    pub cancelled: Vec<PathBuf>,
    /// When set, parse requests are parked in `held` instead of running.
    /// Cancelled requests stay parked so their stale results can be
    /// delivered.
    pub hold_parses: bool,
    pub held: Vec<ParseRequest>,
    pub keep_running: bool,
}

impl CoreHarness {
    pub fn new(config: ConfigFile, fs: MockFileSystem, roots: &[&str]) -> Self {
        Self::with_snapshot(config, fs, roots, UsageSnapshot::default(), RuntimeOptions::default())
    }

    pub fn with_snapshot(
        config: ConfigFile,
        fs: MockFileSystem,
        roots: &[&str],
        snapshot: UsageSnapshot,
        options: RuntimeOptions,
    ) -> Self {
        let registry = Arc::new(ParserRegistry::new().expect("parser registry"));
        let roots = roots.iter().map(PathBuf::from).collect();
        let core = CoreExplorer::new(config, roots, registry, snapshot, None, options)
            .expect("core explorer");
        Self {
            core,
            fs,
            now: Instant::now(),
            deltas: Vec::new(),
            saved: Vec::new(),
            cancelled: Vec::new(),
            hold_parses: false,
            held: Vec::new(),
            keep_running: true,
        }
    }

    /// Run the initial scan to completion.
    pub fn start(&mut self) {
        let step = self.core.start(self.now);
        self.run(step);
    }

    pub fn send(&mut self, event: ExplorerEvent) {
        let step = self.core.step(event, self.now);
        self.run(step);
    }

    /// Move the clock forward and deliver a tick.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        self.send(ExplorerEvent::Tick);
    }

    /// Tick through every pending deadline.
    pub fn settle(&mut self) {
        for _ in 0..32 {
            let Some(deadline) = self.core.next_deadline() else {
                return;
            };
            if deadline > self.now {
                self.now = deadline;
            }
            self.send(ExplorerEvent::Tick);
        }
        panic!("coalescer did not settle");
    }

    /// Deliver parked parse requests in submission order.
    pub fn release(&mut self) {
        let held = std::mem::take(&mut self.held);
        for request in held {
            let batch = self.parse(request);
            self.send(ExplorerEvent::Parsed(batch));
        }
    }

    /// Read parked parse requests now and return their batches undelivered.
    ///
    /// Lets a test land a result whose contents predate later edits.
    pub fn take_held_batches(&mut self) -> Vec<ParseBatch> {
        let held = std::mem::take(&mut self.held);
        held.into_iter().map(|request| self.parse(request)).collect()
    }

    /// Write a file and report it like the watcher would.
    pub fn write(&mut self, path: &str, content: &str) {
        let kind = if self.fs.exists(Path::new(path)) {
            FsEventKind::Modify
        } else {
            FsEventKind::Create
        };
        self.fs.add_file(path, content);
        self.send(ExplorerEvent::Fs(RawFsEvent::file(path, kind)));
    }

    pub fn delete(&mut self, path: &str) {
        self.fs.remove(path);
        self.send(ExplorerEvent::Fs(RawFsEvent::file(path, FsEventKind::Remove)));
    }

    /// Sorted names of the visible tasks of `format`.
    pub fn names(&self, format: TaskFormat) -> Vec<String> {
        let mut names: Vec<String> = self
            .core
            .map()
            .all_by_format(format)
            .into_iter()
            .filter(|node| node.is_visible())
            .map(|node| node.definition.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Every delta published so far, merged into one.
    pub fn merged_deltas(&self) -> ExplorerDelta {
        let mut merged = ExplorerDelta::default();
        for delta in &self.deltas {
            merged.merge(delta.clone());
        }
        merged
    }

    pub fn id(&self, format: TaskFormat, project: &str, file: &str, name: &str) -> TreeId {
        TreeId::new(format, Path::new(project), file, name)
    }

    fn run(&mut self, step: CoreStep) {
        self.keep_running &= step.keep_running;
        let mut queue: VecDeque<CoreCommand> = step.commands.into();
        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                CoreCommand::Discover(request) => {
                    let files = discover(
                        &self.fs,
                        self.core.registry(),
                        self.core.filter(),
                        &request.project,
                        &request.scope,
                        &request.formats,
                    )
                    .expect("discovery");
                    Some(ExplorerEvent::Discovered {
                        scope: request.scope,
                        project: request.project,
                        generation: request.generation,
                        formats: request.formats,
                        files,
                    })
                }
                CoreCommand::Parse(request) => {
                    if self.hold_parses {
                        self.held.push(request);
                        None
                    } else {
                        Some(ExplorerEvent::Parsed(self.parse(request)))
                    }
                }
                CoreCommand::CancelParse(scope) => {
                    self.cancelled.push(scope);
                    None
                }
                CoreCommand::Publish(delta) => {
                    self.deltas.push(delta);
                    None
                }
                CoreCommand::SaveUsage(snapshot) => {
                    self.saved.push(snapshot);
                    None
                }
                CoreCommand::RequestExit => {
                    self.keep_running = false;
                    None
                }
            };
            if let Some(event) = follow_up {
                let step = self.core.step(event, self.now);
                self.keep_running &= step.keep_running;
                queue.extend(step.commands);
            }
        }
    }

    fn parse(&self, request: ParseRequest) -> ParseBatch {
        let registry = self.core.registry();
        let results = request
            .jobs
            .iter()
            .map(|job| FileResult {
                key: job.key.clone(),
                project: job.project.clone(),
                outcome: parse_job(registry, &self.fs, job),
            })
            .collect();
        ParseBatch {
            scope: request.scope,
            generation: request.generation,
            results,
        }
    }
}
