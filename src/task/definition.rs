// src/task/definition.rs

use std::path::PathBuf;

use crate::task::identity::{FileKey, TreeId};
use crate::types::TaskFormat;

/// One task as discovered by a format parser during a single parse pass.
///
/// Never mutated: a re-parse produces a new definition that replaces the old
/// one inside the task map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: String,
    pub format: TaskFormat,
    /// Project (workspace) folder the file belongs to.
    pub project: PathBuf,
    /// Path of the defining file, relative to `project`, forward slashes.
    pub file: String,
    /// Offset of the definition inside the file text; `None` when the parser
    /// cannot point at anything more precise than the file itself.
    pub raw_offset: Option<usize>,
}

impl TaskDefinition {
    pub fn new(
        name: impl Into<String>,
        format: TaskFormat,
        project: impl Into<PathBuf>,
        file: impl Into<String>,
        raw_offset: Option<usize>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            project: project.into(),
            file: file.into(),
            raw_offset,
        }
    }

    pub fn tree_id(&self) -> TreeId {
        TreeId::new(self.format, &self.project, &self.file, &self.name)
    }

    pub fn file_key(&self) -> FileKey {
        FileKey::new(self.format, &self.project, &self.file)
    }

    /// File name component of the defining file.
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}
