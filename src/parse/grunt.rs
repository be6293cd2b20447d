// src/parse/grunt.rs

use std::path::Path;

use regex::Regex;

use crate::errors::Result;
use crate::parse::text::blank_c_comments;
use crate::parse::{compile, first_offset, Located, TaskParser};
use crate::types::TaskFormat;

/// `grunt.registerTask('name', ...)` and `registerMultiTask` calls.
#[derive(Debug)]
pub struct GruntParser {
    register: Regex,
}

impl GruntParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            register: compile(
                r#"\bgrunt\s*\.\s*register(?:Multi)?Task\s*\(\s*(?:"([^"]+)"|'([^']+)')"#,
            )?,
        })
    }

    fn locate(&self, text: &str) -> Vec<Located> {
        let clean = blank_c_comments(text, b"\"'`");
        self.register
            .captures_iter(&clean)
            .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
            .map(|m| Located::new(m.as_str(), m.start()))
            .collect()
    }
}

impl TaskParser for GruntParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Grunt
    }

    fn parse(&self, _path: &Path, text: &str) -> Result<Vec<String>> {
        Ok(self.locate(text).into_iter().map(|l| l.name).collect())
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        first_offset(&self.locate(text), task)
    }
}
