// src/parse/pipenv.rs

use std::path::Path;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::lines_with_offsets;
use crate::parse::TaskParser;
use crate::types::TaskFormat;

/// `[scripts]` table of a `Pipfile`.
#[derive(Debug, Default)]
pub struct PipenvParser;

impl PipenvParser {
    pub fn new() -> Self {
        Self
    }
}

impl TaskParser for PipenvParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Pipenv
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        let table: toml::Table = toml::from_str(text)
            .map_err(|e| ExplorerError::parse(path, e.to_string()))?;

        match table.get("scripts") {
            None => Ok(Vec::new()),
            // Key order is preserved (`toml/preserve_order`).
            Some(toml::Value::Table(scripts)) => Ok(scripts.keys().cloned().collect()),
            Some(_) => Err(ExplorerError::parse(path, "[scripts] is not a table")),
        }
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        let mut in_scripts = false;
        for (offset, line) in lines_with_offsets(text) {
            let trimmed = line.trim_start();
            if trimmed.starts_with('[') {
                in_scripts = trimmed.trim_end() == "[scripts]";
                continue;
            }
            if !in_scripts {
                continue;
            }

            let indent = line.len() - trimmed.len();
            for quote in ["", "\"", "'"] {
                let key = format!("{quote}{task}{quote}");
                if let Some(rest) = trimmed.strip_prefix(&key) {
                    if rest.trim_start().starts_with('=') {
                        return offset + indent + quote.len();
                    }
                }
            }
        }
        0
    }
}
