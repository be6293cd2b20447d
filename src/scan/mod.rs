// src/scan/mod.rs

//! Parse passes: what the core asks for and what comes back.
//!
//! The core never reads files. It emits a [`ParseRequest`] per coalesced
//! scope and receives a [`ParseBatch`] tagged with the generation it was
//! issued for; [`backend`] runs the jobs.

pub mod backend;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{ExplorerError, Result};
use crate::fs::FileSystem;
use crate::parse::{ParserRegistry, tool};
use crate::task::{FileKey, TaskDefinition};
use crate::watch::hash::content_hash;

pub use backend::{ParseBackend, RealParseBackend};

/// One file to (re)parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub key: FileKey,
    pub project: PathBuf,
    pub path: PathBuf,
    /// Hash of the contents the current tree was built from.
    pub known_hash: Option<String>,
    /// Program to enumerate tasks with, for tool-backed formats.
    pub program: Option<String>,
}

impl FileJob {
    /// Path of the file relative to its project.
    pub fn rel_path(&self) -> &str {
        &self.key.file
    }
}

/// All jobs of one synchronization pass for one scope (file or directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequest {
    pub scope: PathBuf,
    pub generation: u64,
    pub jobs: Vec<FileJob>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Parser output in file order, duplicates included.
    pub names: Vec<String>,
    pub definitions: Vec<TaskDefinition>,
    pub hash: String,
}

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(ParsedFile),
    /// Contents hash matches `FileJob::known_hash`.
    Unchanged,
    Failed(ExplorerError),
    /// The file no longer exists.
    Deleted,
}

#[derive(Debug)]
pub struct FileResult {
    pub key: FileKey,
    pub project: PathBuf,
    pub outcome: ParseOutcome,
}

#[derive(Debug)]
pub struct ParseBatch {
    pub scope: PathBuf,
    pub generation: u64,
    pub results: Vec<FileResult>,
}

/// Read and statically parse one file.
pub fn parse_job(registry: &ParserRegistry, fs: &dyn FileSystem, job: &FileJob) -> ParseOutcome {
    let text = match read_job(fs, job) {
        Ok(Some(text)) => text,
        Ok(None) => return ParseOutcome::Deleted,
        Err(err) => return ParseOutcome::Failed(err),
    };
    let hash = content_hash(text.as_bytes());
    if job.known_hash.as_deref() == Some(hash.as_str()) {
        debug!(file = %job.key, "contents unchanged; skipping parse");
        return ParseOutcome::Unchanged;
    }

    match registry.parse(job.key.format, &job.path, &text) {
        Ok(names) => ParseOutcome::Parsed(build_parsed(registry, job, &text, names, hash)),
        Err(err) => ParseOutcome::Failed(err),
    }
}

/// Like [`parse_job`], but enumerates names with the real tool when the job
/// carries a program. The static parser still supplies positions.
pub async fn run_job(
    registry: &ParserRegistry,
    fs: &dyn FileSystem,
    job: &FileJob,
) -> ParseOutcome {
    let Some(program) = job.program.as_deref() else {
        return parse_job(registry, fs, job);
    };

    let text = match read_job(fs, job) {
        Ok(Some(text)) => text,
        Ok(None) => return ParseOutcome::Deleted,
        Err(err) => return ParseOutcome::Failed(err),
    };
    let hash = content_hash(text.as_bytes());
    if job.known_hash.as_deref() == Some(hash.as_str()) {
        debug!(file = %job.key, program, "contents unchanged; not invoking tool");
        return ParseOutcome::Unchanged;
    }

    let cwd = job.path.parent().unwrap_or(Path::new("."));
    match tool::discover_with_tool(job.key.format, program, cwd).await {
        Ok(names) => {
            ParseOutcome::Parsed(build_parsed(registry, job, &text, names, hash))
        }
        Err(err) => {
            warn!(file = %job.key, program, error = %err, "tool discovery failed");
            ParseOutcome::Failed(err)
        }
    }
}

fn read_job(fs: &dyn FileSystem, job: &FileJob) -> Result<Option<String>> {
    if !fs.exists(&job.path) {
        return Ok(None);
    }
    fs.read_to_string(&job.path)
        .map(Some)
        .map_err(|e| ExplorerError::parse(&job.path, format!("{e:#}")))
}

fn build_parsed(
    registry: &ParserRegistry,
    job: &FileJob,
    text: &str,
    names: Vec<String>,
    hash: String,
) -> ParsedFile {
    let definitions =
        registry.create_tasks(job.key.format, &job.project, job.rel_path(), text, &names);
    ParsedFile {
        names,
        definitions,
        hash,
    }
}
