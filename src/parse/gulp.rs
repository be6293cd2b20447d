// src/parse/gulp.rs

//! Gulp tasks, both styles:
//! - gulp 3: `gulp.task('name', ...)`
//! - gulp 4: exported functions. Every exported name is a task, so
//!   `export { build, build as compile }` yields `build` and `compile` even
//!   though both refer to the same function.

use std::path::Path;

use regex::Regex;

use crate::errors::Result;
use crate::parse::text::{blank_c_comments, subslice_offset};
use crate::parse::{compile, first_offset, Located, TaskParser};
use crate::types::TaskFormat;

#[derive(Debug)]
pub struct GulpParser {
    gulp_task: Regex,
    simple_exports: Vec<Regex>,
    bracket_export: Regex,
    export_default: Regex,
    export_list: Regex,
    module_exports_object: Regex,
}

impl GulpParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            gulp_task: compile(
                r#"\bgulp\s*\.\s*task\s*\(\s*(?:"([^"]+)"|'([^']+)'|`([^`]+)`)"#,
            )?,
            simple_exports: vec![
                compile(r"\bmodule\s*\.\s*exports\s*\.\s*([A-Za-z_$][\w$]*)\s*=[^=]")?,
                compile(r"(?:^|[^.\w$])exports\s*\.\s*([A-Za-z_$][\w$]*)\s*=[^=]")?,
                compile(
                    r"\bexport\s+(?:async\s+)?function\s*\*?\s*([A-Za-z_$][\w$]*)",
                )?,
                compile(r"\bexport\s+(?:const|let|var)\s+([A-Za-z_$][\w$]*)")?,
            ],
            bracket_export: compile(
                r#"\bexports\s*\[\s*(?:"([^"]+)"|'([^']+)')\s*\]\s*=[^=]"#,
            )?,
            export_default: compile(r"\bexport\s+(default)\b")?,
            export_list: compile(r"\bexport\s*\{([^}]*)\}")?,
            module_exports_object: compile(r"\bmodule\s*\.\s*exports\s*=\s*\{([^}]*)\}")?,
        })
    }

    fn locate(&self, text: &str) -> Vec<Located> {
        let clean = blank_c_comments(text, b"\"'`");
        let mut found = Vec::new();

        for cap in self.gulp_task.captures_iter(&clean) {
            if let Some(m) = cap.get(1).or_else(|| cap.get(2)).or_else(|| cap.get(3)) {
                found.push(Located::new(m.as_str(), m.start()));
            }
        }

        for re in self.simple_exports.iter() {
            for cap in re.captures_iter(&clean) {
                if let Some(m) = cap.get(1) {
                    found.push(Located::new(m.as_str(), m.start()));
                }
            }
        }

        for cap in self.bracket_export.captures_iter(&clean) {
            if let Some(m) = cap.get(1).or_else(|| cap.get(2)) {
                found.push(Located::new(m.as_str(), m.start()));
            }
        }

        for cap in self.export_default.captures_iter(&clean) {
            if let Some(m) = cap.get(1) {
                found.push(Located::new(m.as_str(), m.start()));
            }
        }

        for cap in self.export_list.captures_iter(&clean) {
            if let Some(body) = cap.get(1) {
                found.extend(list_entries(&clean, body.as_str(), " as "));
            }
        }

        for cap in self.module_exports_object.captures_iter(&clean) {
            if let Some(body) = cap.get(1) {
                found.extend(list_entries(&clean, body.as_str(), ":"));
            }
        }

        found.sort_by_key(|l| l.offset);
        found.dedup_by(|a, b| a.offset == b.offset);
        found
    }
}

/// Entries of `{ a, b as c }` or `{ a, c: b }`.
///
/// For `export { b as c }` the exported name is on the right of `as`; for
/// `module.exports = { c: b }` it is on the left of the colon.
fn list_entries(text: &str, body: &str, alias_sep: &str) -> Vec<Located> {
    let base = subslice_offset(text, body);
    let mut out = Vec::new();
    let mut item_start = 0;

    for item in body.split(',') {
        let (raw, raw_start) = match item.split_once(alias_sep) {
            Some((left, _)) if alias_sep == ":" => (left, item_start),
            Some((left, right)) => (right, item_start + left.len() + alias_sep.len()),
            None => (item, item_start),
        };
        item_start += item.len() + 1;

        let name = raw.trim().trim_matches(['"', '\'']);
        if !is_js_name(name) {
            continue;
        }
        if let Some(within) = raw.find(name) {
            out.push(Located::new(name, base + raw_start + within));
        }
    }

    out
}

fn is_js_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | ':'))
}

impl TaskParser for GulpParser {
    fn format(&self) -> TaskFormat {
        TaskFormat::Gulp
    }

    fn parse(&self, _path: &Path, text: &str) -> Result<Vec<String>> {
        Ok(self.locate(text).into_iter().map(|l| l.name).collect())
    }

    fn document_position(&self, task: &str, text: &str) -> usize {
        first_offset(&self.locate(text), task)
    }
}
