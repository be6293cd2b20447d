// src/parse/maven.rs

use std::path::Path;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::blank_xml_comments;
use crate::parse::TaskParser;
use crate::types::TaskFormat;

/// Standard lifecycle phases, offered for every `pom.xml`.
pub const LIFECYCLE_GOALS: &[&str] = &[
    "clean", "validate", "compile", "test", "package", "verify", "install", "deploy", "site",
];

#[derive(Debug, Default)]
pub struct MavenParser;

impl MavenParser {
    pub fn new() -> Self {
        Self
    }
}

impl TaskParser for MavenParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Maven
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        if !blank_xml_comments(text).contains("<project") {
            return Err(ExplorerError::parse(path, "missing <project> root element"));
        }
        Ok(LIFECYCLE_GOALS.iter().map(|g| g.to_string()).collect())
    }

    fn document_position(&self, _task: &str, _text: &str) -> usize {
        0
    }
}
