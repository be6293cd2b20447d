// src/special/usage.rs

//! Persisted usage state behind the special folders.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fs::FileSystem;
use crate::task::TreeId;

/// Relative path (from the first project root) to the usage file.
///
/// The effective path on disk is `<root>/.taskexplorer/usage.json`.
pub const USAGE_FILE_PATH: &str = ".taskexplorer/usage.json";

pub fn usage_file_path(root: &Path) -> PathBuf {
    root.join(USAGE_FILE_PATH)
}

/// Per-task run statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_duration_ms: Option<u64>,
}

/// Everything the special folders persist (written to `usage.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub favorites: BTreeSet<TreeId>,
    #[serde(default)]
    pub pinned: BTreeSet<TreeId>,
    /// Most recent first.
    #[serde(default)]
    pub last_tasks: VecDeque<TreeId>,
    #[serde(default)]
    pub usage: BTreeMap<TreeId, UsageRecord>,
}

/// Abstract storage for the usage snapshot.
pub trait UsageStore: Send + Sync {
    fn load(&self) -> Result<UsageSnapshot>;
    fn save(&mut self, snapshot: &UsageSnapshot) -> Result<()>;
    /// Path written by `save`, if any.
    fn location(&self) -> Option<PathBuf>;
}

/// Stores the snapshot as JSON in `<root>/.taskexplorer/usage.json`.
pub struct FileUsageStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileUsageStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }
}

impl UsageStore for FileUsageStore {
    fn load(&self) -> Result<UsageSnapshot> {
        let path = usage_file_path(&self.root);
        if !self.fs.exists(&path) {
            return Ok(UsageSnapshot::default());
        }
        let content = self.fs.read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                warn!(?path, error = %err, "malformed usage file; starting empty");
                Ok(UsageSnapshot::default())
            }
        }
    }

    fn save(&mut self, snapshot: &UsageSnapshot) -> Result<()> {
        let path = usage_file_path(&self.root);
        let content =
            serde_json::to_string_pretty(snapshot).context("serialising usage snapshot")?;
        self.fs.write(&path, content.as_bytes())?;
        info!(?path, favorites = snapshot.favorites.len(), "stored usage (file)");
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(usage_file_path(&self.root))
    }
}

/// Keeps the snapshot in memory only.
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    snapshot: UsageSnapshot,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: UsageSnapshot) -> Self {
        Self { snapshot }
    }
}

impl UsageStore for MemoryUsageStore {
    fn load(&self) -> Result<UsageSnapshot> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &UsageSnapshot) -> Result<()> {
        self.snapshot = snapshot.clone();
        info!(favorites = snapshot.favorites.len(), "stored usage (memory)");
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        None
    }
}
