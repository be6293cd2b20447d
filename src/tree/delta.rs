// src/tree/delta.rs

//! Change notifications for the tree-view consumer.
//!
//! A delta names ids only; consumers look nodes up in the task map.

use std::path::PathBuf;

use crate::task::{FileKey, TreeId};
use crate::types::TaskFormat;

/// Minimal change set for one task file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDelta {
    pub project: PathBuf,
    pub file: FileKey,
    pub added: Vec<TreeId>,
    pub removed: Vec<TreeId>,
    /// Ids kept across the pass whose definition changed (position moved).
    pub updated: Vec<TreeId>,
}

impl TreeDelta {
    pub fn new(project: impl Into<PathBuf>, file: FileKey) -> Self {
        Self {
            project: project.into(),
            file,
            added: Vec::new(),
            removed: Vec::new(),
            updated: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Net change in task count.
    pub fn net(&self) -> isize {
        self.added.len() as isize - self.removed.len() as isize
    }
}

/// Everything one core step changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerDelta {
    pub files: Vec<TreeDelta>,
    /// Formats whose nodes changed visibility without a reparse.
    pub visibility_changed: Vec<TaskFormat>,
    /// Ids whose hidden-by-exclusion flag flipped.
    pub exclusion_changed: Vec<TreeId>,
    /// Grouping was rebuilt for every task file.
    pub regrouped: bool,
    /// At least one special folder view changed.
    pub special_changed: bool,
}

impl ExplorerDelta {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.visibility_changed.is_empty()
            && self.exclusion_changed.is_empty()
            && !self.regrouped
            && !self.special_changed
    }

    pub fn push_file(&mut self, delta: TreeDelta) {
        if !delta.is_empty() {
            self.files.push(delta);
        }
    }

    pub fn merge(&mut self, other: ExplorerDelta) {
        self.files.extend(other.files);
        for format in other.visibility_changed {
            if !self.visibility_changed.contains(&format) {
                self.visibility_changed.push(format);
            }
        }
        self.exclusion_changed.extend(other.exclusion_changed);
        self.regrouped |= other.regrouped;
        self.special_changed |= other.special_changed;
    }

    /// Every id removed by this delta, in order.
    pub fn removed_ids(&self) -> impl Iterator<Item = &TreeId> {
        self.files.iter().flat_map(|f| f.removed.iter())
    }
}

/// Receiver of explorer deltas (the tree-view renderer in a real host).
pub trait DeltaSink: Send {
    fn publish(&mut self, delta: &ExplorerDelta);
}

/// Sink that prints a one-line summary per changed file to stdout.
#[derive(Debug, Default)]
pub struct PrintSink;

impl DeltaSink for PrintSink {
    fn publish(&mut self, delta: &ExplorerDelta) {
        for file in &delta.files {
            println!(
                "{}: +{} -{} ~{}",
                file.file,
                file.added.len(),
                file.removed.len(),
                file.updated.len()
            );
        }
        for format in &delta.visibility_changed {
            println!("{format}: visibility changed");
        }
        if !delta.exclusion_changed.is_empty() {
            println!("exclusions: {} task(s) changed", delta.exclusion_changed.len());
        }
        if delta.regrouped {
            println!("grouping rebuilt");
        }
    }
}
