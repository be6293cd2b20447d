// src/parse/ant.rs

use std::path::Path;

use regex::Regex;

use crate::errors::{ExplorerError, Result};
use crate::parse::text::blank_xml_comments;
use crate::parse::{compile, first_offset, Located, TaskParser};
use crate::types::TaskFormat;

/// `<target name="...">` entries of an Ant `build.xml`.
#[derive(Debug)]
pub struct AntParser {
    target: Regex,
}

impl AntParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            target: compile(r#"<target\b[^>]*?\bname\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
        })
    }

    fn locate(&self, text: &str) -> Vec<Located> {
        let clean = blank_xml_comments(text);
        self.target
            .captures_iter(&clean)
            .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
            .filter(|m| !m.as_str().trim().is_empty())
            .map(|m| Located::new(m.as_str(), m.start()))
            .collect()
    }
}

impl TaskParser for AntParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Ant
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>> {
        if !blank_xml_comments(text).contains("<project") {
            return Err(ExplorerError::parse(path, "missing <project> root element"));
        }
        Ok(self.locate(text).into_iter().map(|l| l.name).collect())
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        first_offset(&self.locate(text), task)
    }
}
