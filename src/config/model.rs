// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::TaskFormat;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// enabled_formats = ["make", "npm"]
/// exclude = ["**/node_modules/**"]
/// exclude_tasks = ["^default$"]
///
/// [group]
/// separator = "-"
/// max_level = 2
///
/// [special_folders]
/// num_last_tasks = 10
///
/// [path_to_programs]
/// gulp = "/usr/local/bin/gulp"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub group: GroupSection,

    #[serde(default)]
    pub special_folders: SpecialFoldersSection,

    /// Keys are format names; checked during validation.
    #[serde(default)]
    pub path_to_programs: BTreeMap<String, String>,
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigSection {
    /// Formats to discover. `None` means "each format's default".
    #[serde(default)]
    pub enabled_formats: Option<Vec<TaskFormat>>,

    /// File globs, relative to each project folder.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Regexes matched against task names in every file.
    #[serde(default)]
    pub exclude_tasks: Vec<String>,

    /// Debounce window for filesystem events, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Formats that are enumerated by running the real build tool.
    #[serde(default)]
    pub tool_discovery: Vec<TaskFormat>,

    /// Optional user-level `tasks.json`, shown under "User Tasks".
    #[serde(default)]
    pub user_tasks_file: Option<PathBuf>,
}

fn default_exclude() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            enabled_formats: None,
            exclude: default_exclude(),
            exclude_tasks: Vec::new(),
            debounce_ms: default_debounce_ms(),
            tool_discovery: Vec::new(),
            user_tasks_file: None,
        }
    }
}

/// `[group]` section: collapsing `build-ui-one` / `build-ui-two` under
/// a `build-ui` node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupSection {
    /// Single-character separator. Absent or empty disables grouping.
    #[serde(default)]
    pub separator: Option<String>,

    #[serde(default = "default_max_level")]
    pub max_level: usize,

    /// Show script tasks without their file extension.
    #[serde(default = "default_true")]
    pub strip_script_label: bool,
}

fn default_max_level() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for GroupSection {
    fn default() -> Self {
        Self {
            separator: None,
            max_level: default_max_level(),
            strip_script_label: true,
        }
    }
}

impl GroupSection {
    /// The separator if grouping is on.
    pub fn active_separator(&self) -> Option<&str> {
        self.separator.as_deref().filter(|s| !s.is_empty())
    }
}

/// `[special_folders]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecialFoldersSection {
    #[serde(default = "default_num_last_tasks")]
    pub num_last_tasks: usize,

    #[serde(default = "default_num_famous")]
    pub num_famous: usize,

    #[serde(default = "default_true")]
    pub show_favorites: bool,

    #[serde(default = "default_true")]
    pub show_last_tasks: bool,

    #[serde(default = "default_true")]
    pub show_user_tasks: bool,
}

fn default_num_last_tasks() -> usize {
    10
}

fn default_num_famous() -> usize {
    10
}

impl Default for SpecialFoldersSection {
    fn default() -> Self {
        Self {
            num_last_tasks: default_num_last_tasks(),
            num_famous: default_num_famous(),
            show_favorites: true,
            show_last_tasks: true,
            show_user_tasks: true,
        }
    }
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`, so every glob and regex
/// in here is known to compile.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub group: GroupSection,
    pub special_folders: SpecialFoldersSection,
    path_to_programs: BTreeMap<TaskFormat, String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        group: GroupSection,
        special_folders: SpecialFoldersSection,
        path_to_programs: BTreeMap<TaskFormat, String>,
    ) -> Self {
        Self {
            config,
            group,
            special_folders,
            path_to_programs,
        }
    }

    /// Effective set of enabled formats.
    pub fn enabled_formats(&self) -> BTreeSet<TaskFormat> {
        match &self.config.enabled_formats {
            Some(list) => list.iter().copied().collect(),
            None => TaskFormat::ALL
                .iter()
                .copied()
                .filter(TaskFormat::enabled_by_default)
                .collect(),
        }
    }

    pub fn is_enabled(&self, format: TaskFormat) -> bool {
        self.enabled_formats().contains(&format)
    }

    /// Program used for tool-backed discovery of `format`.
    pub fn program_for(&self, format: TaskFormat) -> &str {
        self.path_to_programs
            .get(&format)
            .map(String::as_str)
            .unwrap_or_else(|| format.default_program())
    }

    pub fn path_to_programs(&self) -> &BTreeMap<TaskFormat, String> {
        &self.path_to_programs
    }

    pub fn uses_tool_discovery(&self, format: TaskFormat) -> bool {
        self.config.tool_discovery.contains(&format)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.debounce_ms)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            ConfigSection::default(),
            GroupSection::default(),
            SpecialFoldersSection::default(),
            BTreeMap::new(),
        )
    }
}
