// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One supported build-tool / task-file convention.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskFormat {
    Ant,
    Bash,
    Batch,
    Composer,
    Gradle,
    Grunt,
    Gulp,
    Make,
    Maven,
    Npm,
    Nsis,
    Perl,
    Pipenv,
    Powershell,
    Python,
    Ruby,
    Tsc,
    Workspace,
}

impl TaskFormat {
    pub const ALL: [TaskFormat; 18] = [
        TaskFormat::Ant,
        TaskFormat::Bash,
        TaskFormat::Batch,
        TaskFormat::Composer,
        TaskFormat::Gradle,
        TaskFormat::Grunt,
        TaskFormat::Gulp,
        TaskFormat::Make,
        TaskFormat::Maven,
        TaskFormat::Npm,
        TaskFormat::Nsis,
        TaskFormat::Perl,
        TaskFormat::Pipenv,
        TaskFormat::Powershell,
        TaskFormat::Python,
        TaskFormat::Ruby,
        TaskFormat::Tsc,
        TaskFormat::Workspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFormat::Ant => "ant",
            TaskFormat::Bash => "bash",
            TaskFormat::Batch => "batch",
            TaskFormat::Composer => "composer",
            TaskFormat::Gradle => "gradle",
            TaskFormat::Grunt => "grunt",
            TaskFormat::Gulp => "gulp",
            TaskFormat::Make => "make",
            TaskFormat::Maven => "maven",
            TaskFormat::Npm => "npm",
            TaskFormat::Nsis => "nsis",
            TaskFormat::Perl => "perl",
            TaskFormat::Pipenv => "pipenv",
            TaskFormat::Powershell => "powershell",
            TaskFormat::Python => "python",
            TaskFormat::Ruby => "ruby",
            TaskFormat::Tsc => "tsc",
            TaskFormat::Workspace => "workspace",
        }
    }

    /// Script formats treat the whole file as a single task.
    pub fn is_script(&self) -> bool {
        matches!(
            self,
            TaskFormat::Bash
                | TaskFormat::Batch
                | TaskFormat::Nsis
                | TaskFormat::Perl
                | TaskFormat::Powershell
                | TaskFormat::Python
                | TaskFormat::Ruby
        )
    }

    /// Whether the format is enabled when the configuration does not list
    /// `enabled_formats` explicitly.
    pub fn enabled_by_default(&self) -> bool {
        !(self.is_script() || matches!(self, TaskFormat::Maven | TaskFormat::Composer))
    }

    /// Formats whose task list can be enumerated by running the real tool.
    pub fn supports_tool_discovery(&self) -> bool {
        matches!(self, TaskFormat::Gulp | TaskFormat::Gradle | TaskFormat::Grunt)
    }

    /// Glob patterns (relative to a project folder) for files of this format.
    pub fn file_globs(&self) -> &'static [&'static str] {
        match self {
            TaskFormat::Ant => &["**/build.xml"],
            TaskFormat::Bash => &["**/*.sh", "**/*.bash"],
            TaskFormat::Batch => &["**/*.bat", "**/*.cmd"],
            TaskFormat::Composer => &["**/composer.json"],
            TaskFormat::Gradle => &["**/build.gradle", "**/build.gradle.kts"],
            TaskFormat::Grunt => &["**/[Gg]runtfile.js"],
            TaskFormat::Gulp => &[
                "**/[Gg]ulpfile.js",
                "**/[Gg]ulpfile.mjs",
                "**/[Gg]ulpfile.cjs",
                "**/[Gg]ulpfile.babel.js",
            ],
            TaskFormat::Make => &["**/[Mm]akefile", "**/GNUmakefile", "**/*.mk"],
            TaskFormat::Maven => &["**/pom.xml"],
            TaskFormat::Npm => &["**/package.json"],
            TaskFormat::Nsis => &["**/*.nsi"],
            TaskFormat::Perl => &["**/*.pl"],
            TaskFormat::Pipenv => &["**/Pipfile"],
            TaskFormat::Powershell => &["**/*.ps1"],
            TaskFormat::Python => &["**/*.py"],
            TaskFormat::Ruby => &["**/*.rb"],
            TaskFormat::Tsc => &["**/tsconfig.json", "**/tsconfig.*.json"],
            TaskFormat::Workspace => &["**/.vscode/tasks.json"],
        }
    }

    /// Default program name used for tool-backed discovery.
    pub fn default_program(&self) -> &'static str {
        match self {
            TaskFormat::Gradle => "gradle",
            TaskFormat::Grunt => "grunt",
            TaskFormat::Gulp => "gulp",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for TaskFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaskFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| format!("unknown task format: {wanted}"))
    }
}

/// Kind of a raw filesystem notification after normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Create,
    Modify,
    Remove,
}
