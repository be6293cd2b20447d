// src/special/mod.rs

//! Special folders derived from the task map plus persisted usage.

pub mod collections;
pub mod usage;

pub use collections::{SpecialCollections, SpecialSettings};
pub use usage::{
    FileUsageStore, MemoryUsageStore, USAGE_FILE_PATH, UsageRecord, UsageSnapshot, UsageStore,
    usage_file_path,
};
