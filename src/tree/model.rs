// src/tree/model.rs

//! Arena-style tree: folders and files hold `TreeId`s, never nodes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::task::{FileKey, TreeId, normalize_path};
use crate::types::TaskFormat;

/// One child of a task file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeItem {
    Task { id: TreeId, label: String },
    /// Synthetic label group produced by separator grouping.
    Group(TaskFile),
}

impl TreeItem {
    pub fn label(&self) -> &str {
        match self {
            TreeItem::Task { label, .. } => label,
            TreeItem::Group(group) => &group.label,
        }
    }
}

/// A source file, or a synthetic group inside one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFile {
    pub key: FileKey,
    /// Project-relative path of the defining file.
    pub path: String,
    pub file_name: String,
    pub label: String,
    pub is_group: bool,
    pub children: Vec<TreeItem>,
}

impl TaskFile {
    pub fn new(key: FileKey, children: Vec<TreeItem>) -> Self {
        let path = key.file.clone();
        let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            label: path.clone(),
            key,
            path,
            file_name,
            is_group: false,
            children,
        }
    }

    pub fn group(parent: &TaskFile, label: impl Into<String>, children: Vec<TreeItem>) -> Self {
        Self {
            key: parent.key.clone(),
            path: parent.path.clone(),
            file_name: parent.file_name.clone(),
            label: label.into(),
            is_group: true,
            children,
        }
    }

    /// Task ids in display order, descending into groups.
    pub fn task_ids(&self) -> Vec<&TreeId> {
        let mut out = Vec::new();
        collect_ids(&self.children, &mut out);
        out
    }
}

fn collect_ids<'a>(items: &'a [TreeItem], out: &mut Vec<&'a TreeId>) {
    for item in items {
        match item {
            TreeItem::Task { id, .. } => out.push(id),
            TreeItem::Group(group) => collect_ids(&group.children, out),
        }
    }
}

/// Top-level grouping by workspace folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFolder {
    pub path: PathBuf,
    pub name: String,
    files: BTreeMap<FileKey, TaskFile>,
}

impl ProjectFolder {
    pub fn new(path: &Path) -> Self {
        let normalized = normalize_path(path);
        let name = normalized
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(&normalized)
            .to_string();
        Self {
            path: path.to_path_buf(),
            name,
            files: BTreeMap::new(),
        }
    }

    /// Task files ordered by format, then path.
    pub fn files(&self) -> impl Iterator<Item = &TaskFile> {
        self.files.values()
    }

    pub fn files_for(&self, format: TaskFormat) -> impl Iterator<Item = &TaskFile> {
        self.files.values().filter(move |f| f.key.format == format)
    }

    pub fn file(&self, key: &FileKey) -> Option<&TaskFile> {
        self.files.get(key)
    }

    pub(crate) fn insert(&mut self, file: TaskFile) {
        self.files.insert(file.key.clone(), file);
    }

    pub(crate) fn remove(&mut self, key: &FileKey) -> Option<TaskFile> {
        self.files.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
