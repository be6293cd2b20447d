// src/filter.rs

//! Exclusion filter consulted by every reconciliation.
//!
//! Two kinds of exclusions live here:
//! - configured ones (`exclude` globs, `exclude_tasks` regexes), which only
//!   hide tasks and can be lifted again by a config change;
//! - live ones added for a single task or file, which remove the entries from
//!   the task map and keep them from being materialised again.

use std::collections::BTreeSet;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::{ExplorerError, Result};
use crate::task::{normalize_path, TaskDefinition, TreeId};

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    globs: GlobSet,
    task_patterns: Vec<Regex>,
    excluded_ids: BTreeSet<TreeId>,
    /// `(normalized project, normalized relative file)`
    excluded_files: BTreeSet<(String, String)>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self {
            globs: GlobSet::empty(),
            task_patterns: Vec::new(),
            excluded_ids: BTreeSet::new(),
            excluded_files: BTreeSet::new(),
        }
    }
}

impl ExclusionFilter {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut filter = Self::default();
        filter.reconfigure(cfg)?;
        Ok(filter)
    }

    /// Recompile configured patterns. Live exclusions are kept.
    ///
    /// On error the previous patterns stay in place.
    pub fn reconfigure(&mut self, cfg: &ConfigFile) -> Result<()> {
        let globs = build_globset(&cfg.config.exclude)?;
        let mut task_patterns = Vec::with_capacity(cfg.config.exclude_tasks.len());
        for pat in cfg.config.exclude_tasks.iter() {
            let re = Regex::new(pat).map_err(|e| {
                ExplorerError::ConfigError(format!("invalid exclude_tasks regex '{pat}': {e}"))
            })?;
            task_patterns.push(re);
        }

        self.globs = globs;
        self.task_patterns = task_patterns;
        Ok(())
    }

    /// Configured glob match for a project-relative path.
    pub fn is_glob_excluded(&self, rel_path: &str) -> bool {
        self.globs.is_match(rel_path)
    }

    /// Whether discovery may skip the directory `rel_dir` entirely.
    ///
    /// Directory globs such as `**/node_modules/**` only match paths below
    /// the directory, so a child path is probed as well.
    pub fn is_dir_excluded(&self, rel_dir: &str) -> bool {
        !rel_dir.is_empty()
            && (self.globs.is_match(rel_dir) || self.globs.is_match(format!("{rel_dir}/_")))
    }

    /// Whether a whole file is excluded, by glob or by a live file exclusion.
    pub fn is_path_excluded(&self, project: &Path, rel_path: &str) -> bool {
        self.is_glob_excluded(rel_path) || self.is_file_removed(project, rel_path)
    }

    /// Live file exclusion only.
    pub fn is_file_removed(&self, project: &Path, rel_path: &str) -> bool {
        let key = (normalize_path(project), normalize_path(Path::new(rel_path)));
        self.excluded_files.contains(&key)
    }

    /// Configured exclusion only: the node is hidden, not removed.
    pub fn is_hidden_by_config(&self, def: &TaskDefinition) -> bool {
        self.is_glob_excluded(&def.file)
            || self.task_patterns.iter().any(|re| re.is_match(&def.name))
    }

    /// Live exclusion: the node must not exist in the task map.
    pub fn is_removed_by_user(&self, def: &TaskDefinition) -> bool {
        if self.excluded_ids.contains(&def.tree_id()) {
            return true;
        }
        self.is_file_removed(&def.project, &def.file)
    }

    pub fn is_excluded(&self, def: &TaskDefinition) -> bool {
        self.is_hidden_by_config(def) || self.is_removed_by_user(def)
    }

    /// Exclude one task. Returns false if it was already excluded.
    pub fn exclude_task(&mut self, id: &TreeId) -> bool {
        let inserted = self.excluded_ids.insert(id.clone());
        debug!(task = %id, inserted, "live task exclusion");
        inserted
    }

    /// Exclude a whole file. Returns false if it was already excluded.
    pub fn exclude_file(&mut self, project: &Path, rel_path: &str) -> bool {
        let key = (normalize_path(project), normalize_path(Path::new(rel_path)));
        let inserted = self.excluded_files.insert(key);
        debug!(?project, file = %rel_path, inserted, "live file exclusion");
        inserted
    }

    pub fn excluded_task_ids(&self) -> impl Iterator<Item = &TreeId> {
        self.excluded_ids.iter()
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| {
            ExplorerError::ConfigError(format!("invalid exclude glob '{pat}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ExplorerError::ConfigError(format!("building exclude globset: {e}")))
}
