// src/config/store.rs

//! Holder for the active configuration.
//!
//! A rejected update never replaces the active configuration.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::types::TaskFormat;

/// What an accepted configuration update touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// Formats that became enabled.
    pub formats_enabled: Vec<TaskFormat>,
    /// Formats that became disabled.
    pub formats_disabled: Vec<TaskFormat>,
    /// `exclude` or `exclude_tasks` changed.
    pub exclusions_changed: bool,
    /// An `exclude` glob was dropped. Discovery may have skipped
    /// directories it matched.
    pub exclude_globs_lifted: bool,
    /// Any `[group]` setting changed.
    pub grouping_changed: bool,
    /// Formats whose program path or tool-discovery setting changed.
    pub programs_changed: Vec<TaskFormat>,
    /// Any `[special_folders]` setting changed.
    pub special_changed: bool,
    pub debounce_changed: bool,
    pub user_tasks_changed: bool,
}

impl ConfigChange {
    pub fn is_empty(&self) -> bool {
        *self == ConfigChange::default()
    }

    /// Changes handled without reparsing anything.
    pub fn is_fast_path(&self) -> bool {
        self.programs_changed.is_empty() && !self.user_tasks_changed && !self.exclude_globs_lifted
    }

    fn between(old: &ConfigFile, new: &ConfigFile) -> Self {
        let old_formats = old.enabled_formats();
        let new_formats = new.enabled_formats();

        let formats_enabled = new_formats.difference(&old_formats).copied().collect();
        let formats_disabled = old_formats.difference(&new_formats).copied().collect();

        let mut programs: BTreeSet<TaskFormat> = BTreeSet::new();
        for format in TaskFormat::ALL {
            if old.program_for(format) != new.program_for(format)
                || old.uses_tool_discovery(format) != new.uses_tool_discovery(format)
            {
                programs.insert(format);
            }
        }

        Self {
            formats_enabled,
            formats_disabled,
            exclusions_changed: old.config.exclude != new.config.exclude
                || old.config.exclude_tasks != new.config.exclude_tasks,
            exclude_globs_lifted: old
                .config
                .exclude
                .iter()
                .any(|glob| !new.config.exclude.contains(glob)),
            grouping_changed: old.group != new.group,
            programs_changed: programs.into_iter().collect(),
            special_changed: old.special_folders != new.special_folders,
            debounce_changed: old.config.debounce_ms != new.config.debounce_ms,
            user_tasks_changed: old.config.user_tasks_file != new.config.user_tasks_file,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: ConfigFile,
}

impl ConfigStore {
    pub fn new(initial: ConfigFile) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &ConfigFile {
        &self.current
    }

    /// Validate `raw` and make it the active configuration.
    ///
    /// On error the previous configuration stays active.
    pub fn update(&mut self, raw: RawConfigFile) -> Result<ConfigChange> {
        let next = match ConfigFile::try_from(raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(error = %err, "rejected configuration update; keeping previous settings");
                return Err(err);
            }
        };
        Ok(self.replace(next))
    }

    /// Swap in an already validated configuration.
    pub fn replace(&mut self, next: ConfigFile) -> ConfigChange {
        let change = ConfigChange::between(&self.current, &next);
        if !change.is_empty() {
            info!(?change, "configuration updated");
        }
        self.current = next;
        change
    }
}
