#![allow(dead_code)]

use std::path::PathBuf;

use taskexplorer::config::{ConfigFile, RawConfigFile};
use taskexplorer::types::TaskFormat;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the file defaults, except that `exclude` is empty so tests
/// opt in to every glob they rely on.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.config.exclude.clear();
        config.config.debounce_ms = 50;
        Self { config }
    }

    /// Enable exactly these formats.
    pub fn with_formats(mut self, formats: &[TaskFormat]) -> Self {
        self.config.config.enabled_formats = Some(formats.to_vec());
        self
    }

    pub fn with_format(mut self, format: TaskFormat) -> Self {
        let formats = self
            .config
            .config
            .enabled_formats
            .get_or_insert_with(Vec::new);
        if !formats.contains(&format) {
            formats.push(format);
        }
        self
    }

    pub fn with_exclude(mut self, glob: &str) -> Self {
        self.config.config.exclude.push(glob.to_string());
        self
    }

    pub fn with_exclude_task(mut self, regex: &str) -> Self {
        self.config.config.exclude_tasks.push(regex.to_string());
        self
    }

    pub fn with_separator(mut self, separator: &str) -> Self {
        self.config.group.separator = Some(separator.to_string());
        self
    }

    pub fn with_max_level(mut self, level: usize) -> Self {
        self.config.group.max_level = level;
        self
    }

    pub fn with_num_last_tasks(mut self, n: usize) -> Self {
        self.config.special_folders.num_last_tasks = n;
        self
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.config.config.debounce_ms = ms;
        self
    }

    pub fn with_tool_discovery(mut self, format: TaskFormat) -> Self {
        self.config.config.tool_discovery.push(format);
        self
    }

    pub fn with_program(mut self, format: TaskFormat, program: &str) -> Self {
        self.config
            .path_to_programs
            .insert(format.to_string(), program.to_string());
        self
    }

    pub fn with_user_tasks_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config.user_tasks_file = Some(path.into());
        self
    }

    /// The unvalidated form, for feeding `ExplorerEvent::ConfigUpdated`.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

