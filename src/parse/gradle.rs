// src/parse/gradle.rs

use std::path::Path;

use regex::Regex;

use crate::errors::Result;
use crate::parse::text::blank_c_comments;
use crate::parse::{compile, first_offset, Located, TaskParser};
use crate::types::TaskFormat;

/// Task declarations in Groovy and Kotlin Gradle build scripts.
#[derive(Debug)]
pub struct GradleParser {
    patterns: Vec<Regex>,
}

impl GradleParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: vec![
                // task hello { ... } / task hello(type: Copy)
                compile(r"(?m)^\s*task\s+([A-Za-z_][\w-]*)")?,
                // task('hello') / task("hello", type: Copy)
                compile(r#"\btask\s*\(\s*["']([\w.-]+)["']"#)?,
                // tasks.register("hello") / tasks.create('hello')
                compile(r#"\btasks\s*\.\s*(?:register|create)\s*(?:<[^>]*>)?\s*\(\s*["']([\w.-]+)["']"#)?,
                // val hello by tasks.registering
                compile(r"\bval\s+([A-Za-z_]\w*)\s+by\s+tasks\s*\.\s*(?:registering|creating)")?,
            ],
        })
    }

    fn locate(&self, text: &str) -> Vec<Located> {
        let clean = blank_c_comments(text, b"\"'");
        let mut found: Vec<Located> = self
            .patterns
            .iter()
            .flat_map(|re| re.captures_iter(&clean).collect::<Vec<_>>())
            .filter_map(|cap| cap.get(1))
            .map(|m| Located::new(m.as_str(), m.start()))
            .collect();
        found.sort_by_key(|l| l.offset);
        found.dedup_by(|a, b| a.offset == b.offset);
        found
    }
}

impl TaskParser for GradleParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Gradle
    }

    fn parse(&self, _path: &Path, text: &str) -> Result<Vec<String>> {
        Ok(self.locate(text).into_iter().map(|l| l.name).collect())
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        first_offset(&self.locate(text), task)
    }
}
