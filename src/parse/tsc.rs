// src/parse/tsc.rs

use std::path::Path;

use serde_json::Value;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::strip_jsonc;
use crate::parse::TaskParser;
use crate::types::TaskFormat;

/// A `tsconfig*.json` contributes a build and a watch task for that config.
#[derive(Debug, Default)]
pub struct TscParser;

impl TscParser {
    pub fn new() -> Self {
        Self
    }
}

impl TaskParser for TscParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Tsc
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        let value: Value = serde_json::from_str(&strip_jsonc(text))
            .map_err(|e| ExplorerError::parse(path, e.to_string()))?;
        if !value.is_object() {
            return Err(ExplorerError::parse(path, "top-level value is not an object"));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "tsconfig.json".to_string());

        Ok(vec![format!("build - {file_name}"), format!("watch - {file_name}")])
    }

    fn document_position(&self, _task: &str, _text: &str) -> usize {
        0
    }
}
