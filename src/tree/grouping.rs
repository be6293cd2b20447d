// src/tree/grouping.rs

//! Separator grouping of task labels.
//!
//! With separator `-` and `max_level = 2`, the tasks `build-ui-one`,
//! `build-ui-two` and `build-api` become:
//!
//! ```text
//! build
//! ├── ui
//! │   ├── one
//! │   └── two
//! └── api
//! ```
//!
//! A group is only created when at least two siblings share the prefix, and
//! it takes the position of its first member.

use std::collections::HashMap;

use crate::config::ConfigFile;
use crate::task::{TaskDefinition, TreeId};
use crate::tree::model::{TaskFile, TreeItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSettings {
    pub separator: Option<String>,
    pub max_level: usize,
    pub strip_script_label: bool,
}

impl GroupSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            separator: cfg.group.active_separator().map(str::to_string),
            max_level: cfg.group.max_level,
            strip_script_label: cfg.group.strip_script_label,
        }
    }

    pub fn ungrouped() -> Self {
        Self {
            separator: None,
            max_level: 1,
            strip_script_label: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.separator.is_some() && self.max_level > 0
    }
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self::ungrouped()
    }
}

/// Display label of a task before grouping.
pub fn task_label(def: &TaskDefinition, settings: &GroupSettings) -> String {
    if settings.strip_script_label && def.format.is_script() {
        if let Some((stem, _ext)) = def.name.rsplit_once('.') {
            if !stem.is_empty() {
                return stem.to_string();
            }
        }
    }
    def.name.clone()
}

/// Build the children of `file` from `(id, label)` pairs in parser order.
pub fn build_children(
    file: &TaskFile,
    tasks: &[(TreeId, String)],
    settings: &GroupSettings,
) -> Vec<TreeItem> {
    match settings.separator.as_deref() {
        Some(sep) if settings.max_level > 0 => {
            let items: Vec<(&TreeId, Vec<&str>)> = tasks
                .iter()
                .map(|(id, label)| (id, label.split(sep).collect()))
                .collect();
            group_level(file, &items, 1, sep, settings.max_level)
        }
        _ => tasks
            .iter()
            .map(|(id, label)| TreeItem::Task {
                id: id.clone(),
                label: label.clone(),
            })
            .collect(),
    }
}

// `level` is 1-based; members at this level share the first `level - 1`
// segments with their parent group.
fn group_level(
    file: &TaskFile,
    items: &[(&TreeId, Vec<&str>)],
    level: usize,
    sep: &str,
    max_level: usize,
) -> Vec<TreeItem> {
    let depth = level - 1;

    let key_of = |segments: &[&str]| -> Option<String> {
        (segments.len() > level).then(|| segments[depth].to_string())
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, segments) in items {
        if let Some(key) = key_of(segments.as_slice()) {
            *counts.entry(key).or_default() += 1;
        }
    }

    let mut out = Vec::new();
    let mut emitted: Vec<String> = Vec::new();

    for (id, segments) in items {
        match key_of(segments.as_slice()) {
            Some(key) if counts.get(&key).copied().unwrap_or(0) >= 2 => {
                if emitted.contains(&key) {
                    continue;
                }
                let members: Vec<(&TreeId, Vec<&str>)> = items
                    .iter()
                    .filter(|(_, s)| key_of(s.as_slice()).as_deref() == Some(key.as_str()))
                    .map(|(id, s)| (*id, s.clone()))
                    .collect();

                let children = if level < max_level {
                    group_level(file, &members, level + 1, sep, max_level)
                } else {
                    members
                        .iter()
                        .map(|(id, s)| TreeItem::Task {
                            id: (*id).clone(),
                            label: s[level..].join(sep),
                        })
                        .collect()
                };

                out.push(TreeItem::Group(TaskFile::group(file, key.clone(), children)));
                emitted.push(key);
            }
            _ => out.push(TreeItem::Task {
                id: (*id).clone(),
                label: segments[depth..].join(sep),
            }),
        }
    }

    out
}
