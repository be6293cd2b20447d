// src/parse/workspace.rs

use std::path::Path;

use serde_json::Value;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::{find_json_value, strip_jsonc};
use crate::parse::TaskParser;
use crate::types::TaskFormat;

/// Workspace-native tasks from a `.vscode/tasks.json` style file.
///
/// Accepts comments and trailing commas. Each entry of `tasks` contributes its
/// `label` (or the legacy `taskName`).
#[derive(Debug, Default)]
pub struct WorkspaceParser;

impl WorkspaceParser {
    pub fn new() -> Self {
        Self
    }
}

fn task_label(task: &Value) -> Option<&str> {
    task.get("label")
        .or_else(|| task.get("taskName"))
        .and_then(Value::as_str)
}

impl TaskParser for WorkspaceParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Workspace
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        let value: Value = serde_json::from_str(&strip_jsonc(text))
            .map_err(|e| ExplorerError::parse(path, e.to_string()))?;

        match value.get("tasks") {
            None => Ok(Vec::new()),
            Some(Value::Array(tasks)) => Ok(tasks
                .iter()
                .filter_map(task_label)
                .map(str::to_string)
                .collect()),
            Some(_) => Err(ExplorerError::parse(path, "\"tasks\" is not an array")),
        }
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        let clean = strip_jsonc(text);
        find_json_value(&clean, "label", task)
            .or_else(|| find_json_value(&clean, "taskName", task))
            .unwrap_or(0)
    }
}
