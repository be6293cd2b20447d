// src/parse/make.rs

//! Makefile rule targets.
//!
//! A target is anything before the rule colon on a non-recipe line, except:
//! - special targets (`.PHONY`, `.DEFAULT`, ...),
//! - suffix rules (`.c.o:`, `.c:`),
//! - pattern rules (`%.o:`),
//! - computed targets containing `$`.
//! Variable assignments (`=`, `:=`, `::=`, `?=`, `+=`) and `define` blocks
//! are skipped.

use std::path::Path;

use crate::errors::Result;
use crate::parse::text::{lines_with_offsets, subslice_offset};
use crate::parse::TaskParser;
use crate::types::TaskFormat;

const DIRECTIVES: &[&str] = &[
    "ifeq", "ifneq", "ifdef", "ifndef", "else", "endif", "include", "-include",
    "sinclude", "export", "unexport", "override", "vpath", "undefine",
];

#[derive(Debug, Default)]
pub struct MakeParser;

impl MakeParser {
    pub fn new() -> Self {
        Self
    }
}

/// Every rule target in declaration order, with its byte offset.
///
/// Duplicates are kept.
pub fn rule_targets(text: &str) -> Vec<(&str, usize)> {
    let mut targets = Vec::new();
    let mut in_define = false;
    let mut continued = false;

    for (offset, line) in lines_with_offsets(text) {
        let was_continued = continued;
        continued = line.ends_with('\\');
        if was_continued || line.starts_with('\t') {
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let first_word = trimmed.split_whitespace().next().unwrap_or("");
        if in_define {
            if first_word == "endef" {
                in_define = false;
            }
            continue;
        }
        if first_word == "define" {
            in_define = true;
            continue;
        }
        if DIRECTIVES.contains(&first_word) {
            continue;
        }

        let content = match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        };
        let Some(colon) = content.find(':') else {
            continue;
        };
        let (before, after) = content.split_at(colon);
        if before.contains('=') || before.contains('$') {
            continue;
        }
        if after.starts_with(":=") || after.starts_with("::=") || after.starts_with(":::=") {
            continue;
        }

        for target in before.split_whitespace() {
            if is_ordinary_target(target) {
                targets.push((target, offset + subslice_offset(line, target)));
            }
        }
    }

    targets
}

/// Whether a rule target names something a user would run.
pub fn is_ordinary_target(target: &str) -> bool {
    if target.contains('%') {
        return false;
    }
    // `.PHONY`, `.SUFFIXES`, `.c.o`, `.c`; a dot followed by a path is a file.
    if target.starts_with('.') && !target.contains('/') {
        return false;
    }
    true
}

impl TaskParser for MakeParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Make
    }

    fn parse(&self, _path: &Path, text: &str) -> Result<Vec<String>> {
        Ok(rule_targets(text)
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect())
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        rule_targets(text)
            .into_iter()
            .find(|(name, _)| *name == task)
            .map(|(_, offset)| offset)
            .unwrap_or(0)
    }
}
