// src/watch/coalescer.rs

//! Debouncing of raw filesystem events into synchronization requests.
//!
//! Pure state driven by explicit `Instant`s so the core can be tested
//! without timers. Per path it keeps:
//! - a generation counter bumped by every accepted event;
//! - at most one pending request, whose action is decided by the *last*
//!   event (a delete followed by a create is a reparse);
//! - at most one in-flight pass. Requests for a path with a pass in flight
//!   stay pending until that pass finishes.
//!
//! A pass whose generation is no longer current when it finishes must not be
//! applied. Events below an in-flight directory pass do not cancel it; every
//! accepted event is stamped instead, and [`EventCoalescer::touched_since`]
//! tells which files of a finished pass were changed after it was issued.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::FsEventKind;

/// How long a self-write marker suppresses events for its path.
pub const EXPECTED_WRITE_TTL: Duration = Duration::from_secs(2);

/// A normalised filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
    pub is_dir: bool,
}

impl RawFsEvent {
    pub fn file(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_dir: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Reparse,
    Delete,
}

impl From<FsEventKind> for SyncAction {
    fn from(kind: FsEventKind) -> Self {
        match kind {
            FsEventKind::Remove => SyncAction::Delete,
            FsEventKind::Create | FsEventKind::Modify => SyncAction::Reparse,
        }
    }
}

/// One coalesced synchronization pass for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub path: PathBuf,
    pub action: SyncAction,
    pub is_dir: bool,
    pub generation: u64,
}

/// What `record` did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Suppressed by an expected-write marker.
    Ignored,
    /// Queued (or merged) for `path`.
    Queued { path: PathBuf },
    /// Queued, and the pass in flight for `path` is now stale.
    Superseded { path: PathBuf },
}

#[derive(Debug, Clone)]
struct Pending {
    action: SyncAction,
    is_dir: bool,
    deadline: Instant,
}

#[derive(Debug)]
pub struct EventCoalescer {
    window: Duration,
    generations: HashMap<PathBuf, u64>,
    pending: BTreeMap<PathBuf, Pending>,
    in_flight: HashMap<PathBuf, u64>,
    expected: HashMap<PathBuf, Instant>,
    /// Sequence number of the last accepted event.
    seq: u64,
    /// Path -> sequence number of its last accepted event.
    touched: HashMap<PathBuf, u64>,
}

impl EventCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generations: HashMap::new(),
            pending: BTreeMap::new(),
            in_flight: HashMap::new(),
            expected: HashMap::new(),
            seq: 0,
            touched: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Accept one raw event.
    pub fn record(&mut self, event: RawFsEvent, now: Instant) -> RecordOutcome {
        self.expected.retain(|_, expiry| *expiry > now);
        if event.kind != FsEventKind::Remove && self.expected.contains_key(&event.path) {
            debug!(path = ?event.path, "ignoring expected self-write");
            return RecordOutcome::Ignored;
        }

        self.seq += 1;
        self.touched.insert(event.path.clone(), self.seq);

        // Absorbed by a pending directory pass above it.
        if let Some(dir) = self.pending_dir_above(&event.path) {
            if let Some(pending) = self.pending.get_mut(&dir) {
                pending.deadline = now + self.window;
            }
            debug!(path = ?event.path, dir = ?dir, "event absorbed by pending directory");
            return self.bump(dir);
        }

        if event.is_dir {
            let dir = event.path.clone();
            self.pending
                .retain(|p, _| !(p != &dir && p.starts_with(&dir)));
        }

        let action = SyncAction::from(event.kind);
        let deadline = now + self.window;
        self.pending
            .entry(event.path.clone())
            .and_modify(|p| {
                p.action = action;
                p.is_dir |= event.is_dir;
                p.deadline = deadline;
            })
            .or_insert(Pending {
                action,
                is_dir: event.is_dir,
                deadline,
            });

        self.bump(event.path)
    }

    /// Suppress non-delete events for `path` for [`EXPECTED_WRITE_TTL`].
    pub fn expect_write(&mut self, path: impl Into<PathBuf>, now: Instant) {
        self.expected.insert(path.into(), now + EXPECTED_WRITE_TTL);
    }

    /// Requests whose debounce window elapsed and whose path is not busy.
    ///
    /// Returned requests are removed from the pending set.
    pub fn due(&mut self, now: Instant) -> Vec<SyncRequest> {
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(path, p)| p.deadline <= now && !self.in_flight.contains_key(*path))
            .map(|(path, _)| path.clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|path| {
                let pending = self.pending.remove(&path)?;
                let generation = self.generation(&path);
                Some(SyncRequest {
                    path,
                    action: pending.action,
                    is_dir: pending.is_dir,
                    generation,
                })
            })
            .collect()
    }

    /// Earliest instant at which `due` can return something.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .iter()
            .filter(|(path, _)| !self.in_flight.contains_key(*path))
            .map(|(_, p)| p.deadline)
            .min()
    }

    /// Mark a pass for `path` as in flight; returns its generation.
    pub fn begin(&mut self, path: &Path) -> u64 {
        let generation = self.generation(path);
        self.in_flight.insert(path.to_path_buf(), generation);
        generation
    }

    /// Sequence number of the last accepted event.
    ///
    /// Taken when a pass is issued and handed back to [`Self::touched_since`].
    pub fn stamp(&self) -> u64 {
        self.seq
    }

    /// Whether an event for `path` or one of its ancestors was accepted
    /// after `stamp`.
    pub fn touched_since(&self, path: &Path, stamp: u64) -> bool {
        path.ancestors()
            .any(|a| self.touched.get(a).is_some_and(|seq| *seq > stamp))
    }

    /// Close the pass for `path`. Returns true when its result may be applied.
    pub fn finish(&mut self, path: &Path, generation: u64) -> bool {
        if self.in_flight.get(path) == Some(&generation) {
            self.in_flight.remove(path);
            self.prune_touched();
        }
        let current = self.is_current(path, generation);
        if !current {
            debug!(?path, generation, "discarding stale pass");
        }
        current
    }

    /// Drop the in-flight marker of an abandoned pass.
    pub fn cancel(&mut self, path: &Path) {
        self.in_flight.remove(path);
        self.prune_touched();
    }

    pub fn is_current(&self, path: &Path, generation: u64) -> bool {
        self.generation(path) == generation
    }

    pub fn generation(&self, path: &Path) -> u64 {
        self.generations.get(path).copied().unwrap_or(0)
    }

    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.in_flight.contains_key(path)
    }

    /// Nothing pending and nothing in flight.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }

    fn bump(&mut self, path: PathBuf) -> RecordOutcome {
        let generation = self.generations.entry(path.clone()).or_insert(0);
        *generation += 1;
        if self.in_flight.contains_key(&path) {
            RecordOutcome::Superseded { path }
        } else {
            RecordOutcome::Queued { path }
        }
    }

    // Stamps only matter while some pass is outstanding.
    fn prune_touched(&mut self) {
        if self.in_flight.is_empty() {
            self.touched.clear();
        }
    }

    fn pending_dir_above(&self, path: &Path) -> Option<PathBuf> {
        path.ancestors()
            .skip(1)
            .find(|a| self.pending.get(*a).is_some_and(|p| p.is_dir))
            .map(Path::to_path_buf)
    }
}
