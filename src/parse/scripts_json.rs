// src/parse/scripts_json.rs

//! `scripts` objects of `package.json` (npm) and `composer.json` (composer).

use std::path::Path;

use serde_json::Value;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::json_key_offset;
use crate::parse::TaskParser;
use crate::types::TaskFormat;

#[derive(Debug)]
pub struct ScriptsJsonParser {
    format: TaskFormat,
}

impl ScriptsJsonParser {
    pub fn npm() -> Self {
        Self {
            format: TaskFormat::Npm,
        }
    }

    pub fn composer() -> Self {
        Self {
            format: TaskFormat::Composer,
        }
    }
}

impl TaskParser for ScriptsJsonParser {
    fn format(&self) -> TaskFormat {
        self.format
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ExplorerError::parse(path, e.to_string()))?;

        let Value::Object(root) = value else {
            return Err(ExplorerError::parse(path, "top-level value is not an object"));
        };

        match root.get("scripts") {
            None | Some(Value::Null) => Ok(Vec::new()),
            // Key order is preserved (`serde_json/preserve_order`).
            Some(Value::Object(scripts)) => Ok(scripts.keys().cloned().collect()),
            Some(_) => Err(ExplorerError::parse(path, "\"scripts\" is not an object")),
        }
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        json_key_offset(text, "scripts", task).unwrap_or(0)
    }
}
