// src/task/identity.rs

//! Stable identities for tasks and task files.
//!
//! A `TreeId` depends only on `(format, project, file, name)`, never on the
//! position of the task in its file or on its siblings.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::types::TaskFormat;

/// Lexically normalise a path into a forward-slash string.
///
/// - `\` becomes `/`
/// - `.` segments are dropped, `..` pops the previous segment
/// - trailing slashes are dropped
///
/// Symlinks are not resolved; two spellings of the same relative path always
/// normalise identically.
pub fn normalize_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let absolute = raw.starts_with('/');

    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(&raw).components() {
        match component {
            Component::Prefix(p) => parts.push(p.as_os_str().to_string_lossy().to_string()),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|p| p.as_str() != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..".to_string());
                }
            }
            Component::Normal(seg) => parts.push(seg.to_string_lossy().to_string()),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Deterministic identity of a task in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(String);

impl TreeId {
    pub fn new(format: TaskFormat, project: &Path, file: &str, name: &str) -> Self {
        TreeId(format!(
            "{}:{}:{}:{}",
            format.as_str(),
            normalize_path(project),
            normalize_path(Path::new(file)),
            name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn format(&self) -> Option<TaskFormat> {
        self.0.split(':').next().and_then(|f| f.parse().ok())
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeId {
    fn from(s: &str) -> Self {
        TreeId(s.to_string())
    }
}

/// Identity of one source file of one format inside one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey {
    pub format: TaskFormat,
    pub project: String,
    pub file: String,
}

impl FileKey {
    pub fn new(format: TaskFormat, project: &Path, file: &str) -> Self {
        Self {
            format,
            project: normalize_path(project),
            file: normalize_path(Path::new(file)),
        }
    }

    /// Identity a task named `name` in this file would get.
    pub fn tree_id(&self, name: &str) -> TreeId {
        TreeId(format!(
            "{}:{}:{}:{}",
            self.format.as_str(),
            self.project,
            self.file,
            name
        ))
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.format, self.project, self.file)
    }
}
