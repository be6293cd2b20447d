// src/engine/mod.rs

//! Orchestration engine for the task explorer.
//!
//! This module ties together:
//! - the event coalescer (what to re-scan, and when)
//! - the tree synchronizer and the task map
//! - the special folders
//! - the main runtime event loop that reacts to:
//!   - filesystem events
//!   - discovery and parse results
//!   - configuration updates and user actions
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::config::RawConfigFile;
use crate::scan::ParseBatch;
use crate::task::TreeId;
use crate::types::TaskFormat;
use crate::watch::{DiscoveredFile, RawFsEvent};

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit once the initial scan and every pending pass finished
    /// (used for `--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, backends and the host.
#[derive(Debug)]
pub enum ExplorerEvent {
    /// A normalised filesystem notification.
    Fs(RawFsEvent),
    /// The earliest coalescer deadline elapsed.
    Tick,
    /// Result of a `CoreCommand::Discover`.
    Discovered {
        scope: PathBuf,
        project: PathBuf,
        generation: u64,
        formats: Vec<TaskFormat>,
        files: Vec<DiscoveredFile>,
    },
    /// A `CoreCommand::Discover` could not walk its scope.
    DiscoveryFailed {
        scope: PathBuf,
        generation: u64,
        message: String,
    },
    /// Result of a `CoreCommand::Parse`.
    Parsed(ParseBatch),
    ConfigUpdated(RawConfigFile),
    ExcludeTask(TreeId),
    ExcludeFile {
        project: PathBuf,
        rel_path: String,
    },
    ToggleFavorite(TreeId),
    TogglePinned(TreeId),
    RunStarted(TreeId),
    /// Reported by the usage collaborator when a run finishes.
    RunCompleted {
        id: TreeId,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreExplorer;
pub use event_handlers::{CoreCommand, CoreStep, DiscoverRequest};
pub use runtime::Runtime;
