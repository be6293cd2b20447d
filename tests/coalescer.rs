// tests/coalescer.rs

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use taskexplorer::types::FsEventKind;
use taskexplorer::watch::{
    EXPECTED_WRITE_TTL, EventCoalescer, RawFsEvent, RecordOutcome, SyncAction,
};

const WINDOW: Duration = Duration::from_millis(100);

fn file(path: &str, kind: FsEventKind) -> RawFsEvent {
    RawFsEvent::file(path, kind)
}

#[test]
fn burst_of_writes_collapses_into_one_request() {
    let start = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);

    for i in 0..5 {
        c.record(
            file("/ws/Makefile", FsEventKind::Modify),
            start + Duration::from_millis(i * 10),
        );
    }

    // The window restarts with every event.
    assert!(c.due(start + Duration::from_millis(100)).is_empty());
    let due = c.due(start + Duration::from_millis(140));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].path, PathBuf::from("/ws/Makefile"));
    assert_eq!(due[0].action, SyncAction::Reparse);
    assert_eq!(due[0].generation, 5);
    assert!(c.is_idle());
}

#[test]
fn delete_then_recreate_is_a_reparse() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);

    c.record(file("/ws/Makefile", FsEventKind::Remove), now);
    c.record(file("/ws/Makefile", FsEventKind::Create), now);

    let due = c.due(now + WINDOW);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].action, SyncAction::Reparse);
}

#[test]
fn create_then_delete_is_a_delete() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);

    c.record(file("/ws/Makefile", FsEventKind::Create), now);
    c.record(file("/ws/Makefile", FsEventKind::Remove), now);

    let due = c.due(now + WINDOW);
    assert_eq!(due[0].action, SyncAction::Delete);
}

#[test]
fn children_of_a_pending_directory_are_absorbed() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);

    c.record(RawFsEvent::dir("/ws/pkg", FsEventKind::Create), now);
    for name in ["a.sh", "b.sh", "sub/Makefile"] {
        let outcome = c.record(file(&format!("/ws/pkg/{name}"), FsEventKind::Create), now);
        assert_eq!(
            outcome,
            RecordOutcome::Queued {
                path: PathBuf::from("/ws/pkg")
            }
        );
    }

    let due = c.due(now + WINDOW);
    assert_eq!(due.len(), 1);
    assert!(due[0].is_dir);
    assert_eq!(due[0].path, PathBuf::from("/ws/pkg"));
}

#[test]
fn directory_event_replaces_pending_children() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);

    c.record(file("/ws/pkg/a.sh", FsEventKind::Modify), now);
    c.record(file("/ws/other/Makefile", FsEventKind::Modify), now);
    c.record(RawFsEvent::dir("/ws/pkg", FsEventKind::Remove), now);

    let mut paths: Vec<PathBuf> = c.due(now + WINDOW).into_iter().map(|r| r.path).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![PathBuf::from("/ws/other/Makefile"), PathBuf::from("/ws/pkg")]
    );
}

#[test]
fn event_during_a_pass_supersedes_it() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);
    let path = Path::new("/ws/gulpfile.js");

    c.record(file("/ws/gulpfile.js", FsEventKind::Modify), now);
    let request = c.due(now + WINDOW).remove(0);
    let generation = c.begin(&request.path);
    assert_eq!(generation, request.generation);

    let outcome = c.record(file("/ws/gulpfile.js", FsEventKind::Modify), now + WINDOW);
    assert_eq!(
        outcome,
        RecordOutcome::Superseded {
            path: path.to_path_buf()
        }
    );

    // Queued, but held back while the stale pass is in flight.
    assert!(c.due(now + WINDOW * 3).is_empty());
    assert_eq!(c.next_deadline(), None);

    // The stale pass must not be applied.
    assert!(!c.finish(path, generation));
    let retry = c.due(now + WINDOW * 3);
    assert_eq!(retry.len(), 1);
    assert!(c.is_current(path, retry[0].generation));
}

#[test]
fn finished_pass_of_current_generation_is_applied() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);
    let path = Path::new("/ws/Makefile");

    c.record(file("/ws/Makefile", FsEventKind::Modify), now);
    let request = c.due(now + WINDOW).remove(0);
    let generation = c.begin(path);
    assert!(c.is_in_flight(path));
    assert!(c.finish(path, generation));
    assert!(!c.is_in_flight(path));
    assert_eq!(request.generation, generation);
}

#[test]
fn expected_write_suppresses_self_events_until_it_expires() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);
    let usage = "/ws/.taskexplorer/usage.json";

    c.expect_write(usage, now);
    assert_eq!(c.record(file(usage, FsEventKind::Modify), now), RecordOutcome::Ignored);
    assert!(c.is_idle());

    // Deletes are never suppressed.
    assert!(matches!(
        c.record(file(usage, FsEventKind::Remove), now),
        RecordOutcome::Queued { .. }
    ));

    let later = now + EXPECTED_WRITE_TTL + Duration::from_millis(1);
    assert!(matches!(
        c.record(file(usage, FsEventKind::Modify), later),
        RecordOutcome::Queued { .. }
    ));
}

#[test]
fn next_deadline_tracks_earliest_pending_path() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);
    assert_eq!(c.next_deadline(), None);

    c.record(file("/ws/a/Makefile", FsEventKind::Modify), now);
    c.record(
        file("/ws/b/Makefile", FsEventKind::Modify),
        now + Duration::from_millis(30),
    );
    assert_eq!(c.next_deadline(), Some(now + WINDOW));

    c.set_window(Duration::from_millis(10));
    assert_eq!(c.window(), Duration::from_millis(10));
}

#[test]
fn events_below_an_in_flight_directory_are_stamped() {
    let now = Instant::now();
    let mut c = EventCoalescer::new(WINDOW);
    let dir = Path::new("/ws/pkg");

    c.record(RawFsEvent::dir("/ws/pkg", FsEventKind::Create), now);
    c.due(now + WINDOW);
    let generation = c.begin(dir);
    let stamp = c.stamp();
    assert!(!c.touched_since(Path::new("/ws/pkg/Makefile"), stamp));

    // A file edit does not cancel the directory pass.
    let outcome = c.record(file("/ws/pkg/Makefile", FsEventKind::Modify), now);
    assert_eq!(
        outcome,
        RecordOutcome::Queued {
            path: PathBuf::from("/ws/pkg/Makefile")
        }
    );
    assert!(c.touched_since(Path::new("/ws/pkg/Makefile"), stamp));
    assert!(!c.touched_since(Path::new("/ws/pkg/package.json"), stamp));

    // A directory event covers everything below it.
    c.record(RawFsEvent::dir("/ws/pkg/sub", FsEventKind::Remove), now);
    assert!(c.touched_since(Path::new("/ws/pkg/sub/a/Makefile"), stamp));

    assert!(c.finish(dir, generation));
}
