// src/watch/discovery.rs

//! Walk a project (or a directory inside it) for recognised task files.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::filter::ExclusionFilter;
use crate::fs::FileSystem;
use crate::parse::ParserRegistry;
use crate::types::TaskFormat;
use crate::watch::path_utils::relative_str;

/// A task file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredFile {
    pub format: TaskFormat,
    /// Project-relative path, forward slashes.
    pub rel_path: String,
    pub path: PathBuf,
}

/// Find files of `formats` at or below `scope` inside `project`.
///
/// Directories matched by the configured exclude globs are not entered, and
/// files removed by a live exclusion are skipped. The result is ordered by
/// format, then path.
pub fn discover(
    fs: &dyn FileSystem,
    registry: &ParserRegistry,
    filter: &ExclusionFilter,
    project: &Path,
    scope: &Path,
    formats: &[TaskFormat],
) -> Result<Vec<DiscoveredFile>> {
    let mut found = Vec::new();

    // A scope that vanished simply has no files.
    if !fs.exists(scope) {
        return Ok(found);
    }

    if fs.is_file(scope) {
        if let Some(file) = classify(registry, filter, project, scope, formats) {
            found.push(file);
        }
        return Ok(found);
    }

    let mut stack = vec![scope.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs.read_dir(&dir)? {
            if fs.is_dir(&entry) {
                let rel = relative_str(project, &entry).unwrap_or_default();
                if filter.is_dir_excluded(&rel) {
                    debug!(dir = %rel, "skipping excluded directory");
                    continue;
                }
                stack.push(entry);
            } else if let Some(file) = classify(registry, filter, project, &entry, formats) {
                found.push(file);
            }
        }
    }

    found.sort();
    debug!(?project, ?scope, count = found.len(), "discovery finished");
    Ok(found)
}

fn classify(
    registry: &ParserRegistry,
    filter: &ExclusionFilter,
    project: &Path,
    path: &Path,
    formats: &[TaskFormat],
) -> Option<DiscoveredFile> {
    let rel = relative_str(project, path)?;
    let format = registry.format_for_path(&rel)?;
    if !formats.contains(&format) {
        return None;
    }
    if filter.is_file_removed(project, &rel) {
        return None;
    }
    Some(DiscoveredFile {
        format,
        rel_path: rel,
        path: path.to_path_buf(),
    })
}
