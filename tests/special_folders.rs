// tests/special_folders.rs

mod common;

use chrono::{TimeZone, Utc};
use common::{CoreHarness, ConfigFileBuilder, ROOT, init_tracing, sample_workspace};
use taskexplorer::engine::{ExplorerEvent, RuntimeOptions};
use taskexplorer::fs::mock::MockFileSystem;
use taskexplorer::special::{UsageRecord, UsageSnapshot};
use taskexplorer::task::TreeId;
use taskexplorer::types::TaskFormat;

const MAKEFILE: &str = "build:\n\tcc main.c\n\ntest: build\n\t./run-tests\n\nclean:\n\trm -f a.out\n";

fn harness(builder: ConfigFileBuilder) -> CoreHarness {
    init_tracing();
    let mut h = CoreHarness::new(builder.build(), sample_workspace(), &[ROOT]);
    h.start();
    h
}

fn make_npm() -> ConfigFileBuilder {
    ConfigFileBuilder::new().with_formats(&[TaskFormat::Make, TaskFormat::Npm])
}

fn make_id(name: &str) -> TreeId {
    TreeId::new(TaskFormat::Make, std::path::Path::new(ROOT), "Makefile", name)
}

fn complete(h: &mut CoreHarness, name: &str, minute: u32) {
    h.send(ExplorerEvent::RunStarted(make_id(name)));
    h.send(ExplorerEvent::RunCompleted {
        id: make_id(name),
        duration_ms: 100,
        at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
    });
}

#[test]
fn favorite_survives_edits_to_sibling_tasks() {
    let mut h = harness(make_npm());
    let build = make_id("build");

    h.send(ExplorerEvent::ToggleFavorite(build.clone()));
    assert_eq!(h.core.special().favorites(h.core.map()), vec![build.clone()]);
    assert!(h.core.map().get(&build).unwrap().state.favorite);

    h.write("/ws/Makefile", "build:\n\tcc main.c\n\nclean:\n\trm -f a.out\n");
    h.settle();

    assert_eq!(h.core.special().favorites(h.core.map()), vec![build.clone()]);
    assert!(h.core.map().get(&build).unwrap().state.favorite);
}

#[test]
fn favorite_is_dropped_with_its_task_and_not_restored() {
    let mut h = harness(make_npm());
    let clean = make_id("clean");
    h.send(ExplorerEvent::ToggleFavorite(clean.clone()));

    h.delete("/ws/Makefile");
    h.settle();
    assert!(h.core.special().favorites(h.core.map()).is_empty());
    assert!(!h.core.special().snapshot().favorites.contains(&clean));
    assert!(h.deltas.last().unwrap().special_changed);

    h.write("/ws/Makefile", MAKEFILE);
    h.settle();
    assert!(h.core.map().contains(&clean));
    assert!(!h.core.map().get(&clean).unwrap().state.favorite);
    assert!(h.core.special().favorites(h.core.map()).is_empty());
}

#[test]
fn toggling_an_unknown_task_changes_nothing() {
    let mut h = harness(make_npm());
    let published = h.deltas.len();

    h.send(ExplorerEvent::ToggleFavorite(make_id("nope")));

    assert_eq!(h.deltas.len(), published);
    assert!(h.saved.is_empty());
}

#[test]
fn toggling_persists_usage() {
    let mut h = harness(make_npm());
    let test = make_id("test");

    h.send(ExplorerEvent::ToggleFavorite(test.clone()));
    h.send(ExplorerEvent::TogglePinned(test.clone()));

    let last = h.saved.last().unwrap();
    assert!(last.favorites.contains(&test));
    assert!(last.pinned.contains(&test));

    h.send(ExplorerEvent::ToggleFavorite(test.clone()));
    assert!(!h.saved.last().unwrap().favorites.contains(&test));
}

#[test]
fn last_tasks_are_most_recent_first_and_evict_from_the_tail() {
    let mut h = harness(make_npm().with_num_last_tasks(2));

    for name in ["build", "test", "clean"] {
        h.send(ExplorerEvent::RunStarted(make_id(name)));
    }
    assert_eq!(
        h.core.special().last_tasks(h.core.map()),
        vec![make_id("clean"), make_id("test")]
    );

    // Re-running moves to the head without duplicating.
    h.send(ExplorerEvent::RunStarted(make_id("test")));
    assert_eq!(
        h.core.special().last_tasks(h.core.map()),
        vec![make_id("test"), make_id("clean")]
    );
}

#[test]
fn lowering_the_limit_trims_last_tasks() {
    let mut h = harness(make_npm());
    for name in ["build", "test", "clean"] {
        h.send(ExplorerEvent::RunStarted(make_id(name)));
    }
    assert_eq!(h.core.special().last_tasks(h.core.map()).len(), 3);

    h.send(ExplorerEvent::ConfigUpdated(make_npm().with_num_last_tasks(1).raw()));

    assert_eq!(h.core.special().last_tasks(h.core.map()), vec![make_id("clean")]);
    assert!(h.deltas.last().unwrap().special_changed);
    assert_eq!(h.saved.last().unwrap().last_tasks.len(), 1);
}

#[test]
fn famous_ranks_by_count_then_recency() {
    let mut h = harness(make_npm());

    complete(&mut h, "build", 0);
    complete(&mut h, "build", 1);
    complete(&mut h, "test", 2);
    complete(&mut h, "clean", 3);

    assert_eq!(
        h.core.special().famous(h.core.map()),
        vec![make_id("build"), make_id("clean"), make_id("test")]
    );
    let build = h.core.map().get(&make_id("build")).unwrap();
    assert_eq!(build.state.run_count, 2);
    assert!(!build.state.running);
}

#[test]
fn running_view_follows_run_events() {
    let mut h = harness(make_npm());
    let test = make_id("test");

    h.send(ExplorerEvent::RunStarted(test.clone()));
    assert_eq!(h.core.special().running(h.core.map()), vec![test.clone()]);

    h.send(ExplorerEvent::RunCompleted {
        id: test.clone(),
        duration_ms: 42,
        at: Utc::now(),
    });
    assert!(h.core.special().running(h.core.map()).is_empty());
}

#[test]
fn hidden_tasks_are_left_out_of_the_views() {
    let mut h = harness(make_npm());
    let build = make_id("build");
    h.send(ExplorerEvent::ToggleFavorite(build.clone()));
    complete(&mut h, "build", 0);

    h.send(ExplorerEvent::ConfigUpdated(
        ConfigFileBuilder::new().with_formats(&[TaskFormat::Npm]).raw(),
    ));

    assert!(h.core.special().favorites(h.core.map()).is_empty());
    assert!(h.core.special().famous(h.core.map()).is_empty());
    // Hidden, not forgotten.
    assert!(h.core.special().snapshot().favorites.contains(&build));
}

#[test]
fn persisted_usage_seeds_new_nodes() {
    init_tracing();
    let build = make_id("build");
    let mut snapshot = UsageSnapshot::default();
    snapshot.favorites.insert(build.clone());
    snapshot.usage.insert(
        build.clone(),
        UsageRecord {
            run_count: 3,
            last_run_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            last_duration_ms: Some(900),
        },
    );

    let mut h = CoreHarness::with_snapshot(
        make_npm().build(),
        sample_workspace(),
        &[ROOT],
        snapshot,
        RuntimeOptions::default(),
    );
    h.start();

    let node = h.core.map().get(&build).unwrap();
    assert!(node.state.favorite);
    assert_eq!(node.state.run_count, 3);
    assert_eq!(h.core.special().favorites(h.core.map()), vec![build.clone()]);
    assert_eq!(h.core.special().famous(h.core.map()), vec![build]);
}

#[test]
fn user_tasks_file_feeds_its_own_folder() {
    init_tracing();
    let fs = sample_workspace();
    fs.add_file(
        "/home/dev/tasks.json",
        r#"{
            // shared tasks
            "tasks": [
                { "label": "deploy" },
                { "label": "backup", },
            ]
        }"#,
    );
    let config = make_npm()
        .with_format(TaskFormat::Workspace)
        .with_user_tasks_file("/home/dev/tasks.json")
        .build();
    let mut h = CoreHarness::new(config, fs, &[ROOT]);
    h.start();

    let user: Vec<String> = h
        .core
        .special()
        .user_tasks(h.core.map())
        .iter()
        .filter_map(|id| h.core.map().get(id))
        .map(|node| node.definition.name.clone())
        .collect();
    // Ids sort by name within the file.
    assert_eq!(user, vec!["backup", "deploy"]);
}

#[test]
fn pinned_state_is_seeded_from_usage() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/ws/Makefile", MAKEFILE);
    let mut snapshot = UsageSnapshot::default();
    snapshot.pinned.insert(make_id("test"));

    let mut h = CoreHarness::with_snapshot(
        make_npm().build(),
        fs,
        &[ROOT],
        snapshot,
        RuntimeOptions::default(),
    );
    h.start();

    assert!(h.core.map().get(&make_id("test")).unwrap().state.pinned);
    assert!(!h.core.map().get(&make_id("build")).unwrap().state.pinned);
}
