// src/tree/mod.rs

//! The authoritative task tree.
//!
//! `Project -> File -> [Group levels] -> Task`, holding only `TreeId`s; the
//! [`TaskMap`](crate::task::TaskMap) owns the nodes.

pub mod delta;
pub mod grouping;
pub mod model;
pub mod sync;

pub use delta::{DeltaSink, ExplorerDelta, PrintSink, TreeDelta};
pub use grouping::{GroupSettings, build_children, task_label};
pub use model::{ProjectFolder, TaskFile, TreeItem};
pub use sync::{FileRecord, SyncContext, SyncPhase, TreeSynchronizer};
