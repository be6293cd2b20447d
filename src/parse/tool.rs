// src/parse/tool.rs

//! Tool-backed task enumeration.
//!
//! Some formats can only be enumerated faithfully by asking the real build
//! tool (gulp with transpiled gulpfiles, gradle with plugin-provided tasks).
//! The child process is spawned with `kill_on_drop(true)`, so aborting the
//! owning tokio task abandons the tool run.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{ExplorerError, Result};
use crate::types::TaskFormat;

/// Arguments passed to the tool to make it list its tasks.
pub fn tool_args(format: TaskFormat) -> &'static [&'static str] {
    match format {
        TaskFormat::Gulp => &["--tasks-simple"],
        TaskFormat::Gradle => &["-q", "tasks", "--all"],
        TaskFormat::Grunt => &["--help", "--no-color"],
        _ => &[],
    }
}

/// Run `program` for `format` inside `cwd` and parse its task listing.
pub async fn discover_with_tool(
    format: TaskFormat,
    program: &str,
    cwd: &Path,
) -> Result<Vec<String>> {
    if !format.supports_tool_discovery() {
        return Err(ExplorerError::ToolInvocation {
            program: program.to_string(),
            message: format!("{format} does not support tool discovery"),
        });
    }

    let args = tool_args(format);
    debug!(%format, program, ?args, ?cwd, "running tool for task discovery");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ExplorerError::ToolInvocation {
            program: program.to_string(),
            message: format!("failed to launch: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code().unwrap_or(-1);
        return Err(ExplorerError::ToolInvocation {
            program: program.to_string(),
            message: format!("exited with code {code}: {}", stderr.trim()),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let tasks = parse_tool_output(format, &stdout);
    info!(%format, program, count = tasks.len(), "tool discovery finished");
    Ok(tasks)
}

/// Extract task names from a tool's listing.
pub fn parse_tool_output(format: TaskFormat, stdout: &str) -> Vec<String> {
    match format {
        TaskFormat::Gulp => gulp_tasks(stdout),
        TaskFormat::Gradle => gradle_tasks(stdout),
        TaskFormat::Grunt => grunt_tasks(stdout),
        _ => Vec::new(),
    }
}

fn gulp_tasks(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('['))
        .map(str::to_string)
        .collect()
}

// Lines look like `build - Assembles and tests this project.` under
// `Build tasks` / `-----------` headers.
fn gradle_tasks(stdout: &str) -> Vec<String> {
    let mut tasks = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().all(|c| c == '-') {
            continue;
        }
        let name = match line.split_once(" - ") {
            Some((name, _)) => name.trim(),
            None if !line.contains(char::is_whitespace) && !line.ends_with(':') => line,
            None => continue,
        };
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            tasks.push(name.to_string());
        }
    }
    tasks
}

// The task table follows an `Available tasks` header and ends at the first
// blank line.
fn grunt_tasks(stdout: &str) -> Vec<String> {
    let mut tasks = Vec::new();
    let mut in_table = false;
    for line in stdout.lines() {
        if !in_table {
            in_table = line.trim() == "Available tasks";
            continue;
        }
        if line.trim().is_empty() {
            if tasks.is_empty() {
                continue;
            }
            break;
        }
        if let Some(name) = line.split_whitespace().next() {
            tasks.push(name.to_string());
        }
    }
    tasks
}
