// src/parse/mod.rs

//! Format parsers.
//!
//! Each supported format implements [`TaskParser`]; the [`registry`] maps a
//! format to its parser and a project-relative path to its format. Parsers
//! never panic on malformed input: they return `Err(ExplorerError::Parse)`
//! and the synchronizer decides what to keep.
//!
//! [`tool`] enumerates tasks by running the real build tool instead.

pub mod ant;
pub mod gradle;
pub mod grunt;
pub mod gulp;
pub mod make;
pub mod maven;
pub mod pipenv;
pub mod registry;
pub mod script;
pub mod scripts_json;
pub mod text;
pub mod tool;
pub mod tsc;
pub mod workspace;

use std::fmt::Debug;
use std::path::Path;

use regex::Regex;

use crate::errors::{ExplorerError, Result};
use crate::task::TaskDefinition;
use crate::types::TaskFormat;

pub use registry::ParserRegistry;

/// Capability interface implemented once per format.
pub trait TaskParser: Send + Sync + Debug {
    fn format(&self) -> TaskFormat;

    /// Ordered task names defined by `text`. Order becomes tree order.
    fn parse(&self, path: &Path, text: &str) -> Result<Vec<String>>;

    /// Byte offset of the first definition of `task` in `text`.
    ///
    /// `0` means "not found" or "no meaningful position".
    fn document_position(&self, task: &str, text: &str) -> usize;

    /// Build the definition for one discovered task.
    fn create_task(&self, name: &str, project: &Path, file: &str, text: &str) -> TaskDefinition {
        let position = self.document_position(name, text);
        TaskDefinition::new(
            name,
            self.format(),
            project,
            file,
            (position != 0).then_some(position),
        )
    }
}

/// A task name with the byte offset it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub name: String,
    pub offset: usize,
}

impl Located {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// Offset of the first entry named `name`, or `0`.
pub fn first_offset(found: &[Located], name: &str) -> usize {
    found
        .iter()
        .find(|l| l.name == name)
        .map(|l| l.offset)
        .unwrap_or(0)
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExplorerError::Other(anyhow::anyhow!("invalid parser regex {pattern:?}: {e}"))
    })
}
