// src/config/validate.rs

use std::collections::BTreeMap;

use globset::Glob;
use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ExplorerError, Result};
use crate::types::TaskFormat;

pub const MAX_GROUP_LEVEL: usize = 10;
pub const MAX_LAST_TASKS: usize = 100;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ExplorerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let programs = validate_programs(&raw.path_to_programs)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.group,
            raw.special_folders,
            programs,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_exclude_globs(cfg)?;
    validate_task_regexes(cfg)?;
    validate_group(cfg)?;
    validate_special_folders(cfg)?;
    validate_tool_discovery(cfg)?;
    Ok(())
}

fn validate_exclude_globs(cfg: &RawConfigFile) -> Result<()> {
    for pat in cfg.config.exclude.iter() {
        Glob::new(pat).map_err(|e| {
            ExplorerError::ConfigError(format!("invalid exclude glob '{pat}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_task_regexes(cfg: &RawConfigFile) -> Result<()> {
    for pat in cfg.config.exclude_tasks.iter() {
        Regex::new(pat).map_err(|e| {
            ExplorerError::ConfigError(format!("invalid exclude_tasks regex '{pat}': {e}"))
        })?;
    }
    Ok(())
}

fn validate_group(cfg: &RawConfigFile) -> Result<()> {
    if cfg.group.max_level == 0 || cfg.group.max_level > MAX_GROUP_LEVEL {
        return Err(ExplorerError::ConfigError(format!(
            "[group].max_level must be within 1..={MAX_GROUP_LEVEL} (got {})",
            cfg.group.max_level
        )));
    }

    if let Some(sep) = cfg.group.separator.as_deref() {
        if sep.chars().count() > 1 {
            return Err(ExplorerError::ConfigError(format!(
                "[group].separator must be a single character (got '{sep}')"
            )));
        }
        if sep.chars().any(char::is_whitespace) {
            return Err(ExplorerError::ConfigError(
                "[group].separator cannot be whitespace".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_special_folders(cfg: &RawConfigFile) -> Result<()> {
    let sf = &cfg.special_folders;
    if sf.num_last_tasks == 0 || sf.num_last_tasks > MAX_LAST_TASKS {
        return Err(ExplorerError::ConfigError(format!(
            "[special_folders].num_last_tasks must be within 1..={MAX_LAST_TASKS} (got {})",
            sf.num_last_tasks
        )));
    }
    if sf.num_famous == 0 || sf.num_famous > MAX_LAST_TASKS {
        return Err(ExplorerError::ConfigError(format!(
            "[special_folders].num_famous must be within 1..={MAX_LAST_TASKS} (got {})",
            sf.num_famous
        )));
    }
    Ok(())
}

fn validate_tool_discovery(cfg: &RawConfigFile) -> Result<()> {
    for format in cfg.config.tool_discovery.iter() {
        if !format.supports_tool_discovery() {
            return Err(ExplorerError::ConfigError(format!(
                "format '{format}' cannot be enumerated by an external tool"
            )));
        }
    }
    Ok(())
}

fn validate_programs(
    raw: &BTreeMap<String, String>,
) -> Result<BTreeMap<TaskFormat, String>> {
    let mut programs = BTreeMap::new();
    for (name, program) in raw.iter() {
        let format: TaskFormat = name.parse().map_err(|e: String| {
            ExplorerError::ConfigError(format!("[path_to_programs]: {e}"))
        })?;
        if program.trim().is_empty() {
            return Err(ExplorerError::ConfigError(format!(
                "[path_to_programs].{name} cannot be empty"
            )));
        }
        programs.insert(format, program.clone());
    }
    Ok(programs)
}
