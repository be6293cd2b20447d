// src/parse/script.rs

use std::path::Path;

use crate::errors::{ExplorerError, Result};
use crate::parse::TaskParser;
use crate::types::TaskFormat;

/// Plain script files: the file itself is the task, named by its file name.
#[derive(Debug)]
pub struct ScriptParser {
    format: TaskFormat,
}

impl ScriptParser {
    pub fn new(format: TaskFormat) -> Self {
        Self { format }
    }
}

impl TaskParser for ScriptParser {
    fn format(&self) -> TaskFormat {
        self.format
    }

    fn parse(&self, path: &Path, _text: &str) -> Result<Vec<String>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ExplorerError::parse(path, "script path has no file name"))?;
        Ok(vec![name])
    }

    fn document_position(&self, _task: &str, _text: &str) -> usize {
        0
    }
}
