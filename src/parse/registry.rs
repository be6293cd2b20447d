// src/parse/registry.rs

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{ExplorerError, Result};
use crate::parse::ant::AntParser;
use crate::parse::gradle::GradleParser;
use crate::parse::grunt::GruntParser;
use crate::parse::gulp::GulpParser;
use crate::parse::make::MakeParser;
use crate::parse::maven::MavenParser;
use crate::parse::pipenv::PipenvParser;
use crate::parse::script::ScriptParser;
use crate::parse::scripts_json::ScriptsJsonParser;
use crate::parse::tsc::TscParser;
use crate::parse::workspace::WorkspaceParser;
use crate::parse::TaskParser;
use crate::task::TaskDefinition;
use crate::types::TaskFormat;

/// Lookup table from format to parser, plus file recognition.
#[derive(Debug)]
pub struct ParserRegistry {
    parsers: BTreeMap<TaskFormat, Box<dyn TaskParser>>,
    matchers: Vec<(TaskFormat, GlobSet)>,
}

impl ParserRegistry {
    /// Registry with every built-in format.
    pub fn new() -> Result<Self> {
        let mut parsers: BTreeMap<TaskFormat, Box<dyn TaskParser>> = BTreeMap::new();
        parsers.insert(TaskFormat::Ant, Box::new(AntParser::new()?));
        parsers.insert(TaskFormat::Composer, Box::new(ScriptsJsonParser::composer()));
        parsers.insert(TaskFormat::Gradle, Box::new(GradleParser::new()?));
        parsers.insert(TaskFormat::Grunt, Box::new(GruntParser::new()?));
        parsers.insert(TaskFormat::Gulp, Box::new(GulpParser::new()?));
        parsers.insert(TaskFormat::Make, Box::new(MakeParser::new()));
        parsers.insert(TaskFormat::Maven, Box::new(MavenParser::new()));
        parsers.insert(TaskFormat::Npm, Box::new(ScriptsJsonParser::npm()));
        parsers.insert(TaskFormat::Pipenv, Box::new(PipenvParser::new()));
        parsers.insert(TaskFormat::Tsc, Box::new(TscParser::new()));
        parsers.insert(TaskFormat::Workspace, Box::new(WorkspaceParser::new()));
        for format in TaskFormat::ALL.into_iter().filter(TaskFormat::is_script) {
            parsers.insert(format, Box::new(ScriptParser::new(format)));
        }

        let mut matchers = Vec::with_capacity(TaskFormat::ALL.len());
        for format in TaskFormat::ALL {
            matchers.push((format, build_matcher(format)?));
        }

        Ok(Self { parsers, matchers })
    }

    pub fn parser(&self, format: TaskFormat) -> Option<&dyn TaskParser> {
        self.parsers.get(&format).map(|p| p.as_ref())
    }

    /// Format recognising the project-relative `rel_path`, if any.
    pub fn format_for_path(&self, rel_path: &str) -> Option<TaskFormat> {
        self.matchers
            .iter()
            .find(|(_, set)| set.is_match(rel_path))
            .map(|(format, _)| *format)
    }

    /// Parse one file into ordered task names.
    pub fn parse(&self, format: TaskFormat, path: &Path, text: &str) -> Result<Vec<String>> {
        let parser = self.parser(format).ok_or_else(|| {
            ExplorerError::parse(path, format!("no parser registered for {format}"))
        })?;
        let names = parser.parse(path, text)?;
        debug!(%format, ?path, count = names.len(), "parsed file");
        Ok(names)
    }

    /// Definitions for `names`, positioned against `text`.
    pub fn create_tasks(
        &self,
        format: TaskFormat,
        project: &Path,
        rel_path: &str,
        text: &str,
        names: &[String],
    ) -> Vec<TaskDefinition> {
        match self.parser(format) {
            Some(parser) => names
                .iter()
                .map(|name| parser.create_task(name, project, rel_path, text))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn document_position(&self, format: TaskFormat, task: &str, text: &str) -> usize {
        self.parser(format)
            .map(|p| p.document_position(task, text))
            .unwrap_or(0)
    }
}

fn build_matcher(format: TaskFormat) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in format.file_globs() {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid file glob for {format}: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder
        .build()
        .with_context(|| format!("building file globset for {format}"))?)
}
