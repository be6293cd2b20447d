// src/task/mod.rs

//! Task identity and the process-wide task map.
//!
//! - [`definition`] holds the immutable parser output for one task.
//! - [`identity`] derives stable `TreeId`s and `FileKey`s from definitions.
//! - [`map`] owns every `TaskNode` and its runtime state.

pub mod definition;
pub mod identity;
pub mod map;

pub use definition::TaskDefinition;
pub use identity::{normalize_path, FileKey, TreeId};
pub use map::{RuntimeState, TaskMap, TaskNode, UpsertOutcome};
