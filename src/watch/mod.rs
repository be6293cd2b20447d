// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - turning `notify` events into normalised create/modify/remove events;
//! - debouncing them per path into synchronization requests ([`coalescer`]);
//! - finding task files under a project or directory ([`discovery`]);
//! - content hashing so unchanged saves skip diffing ([`hash`]).
//!
//! It does **not** parse files or touch the task map.

pub mod coalescer;
pub mod discovery;
pub mod hash;
pub mod path_utils;
pub mod watcher;

pub use coalescer::{
    EXPECTED_WRITE_TTL, EventCoalescer, RawFsEvent, RecordOutcome, SyncAction, SyncRequest,
};
pub use discovery::{DiscoveredFile, discover};
pub use watcher::{WatcherHandle, spawn_watcher, to_raw_events};
