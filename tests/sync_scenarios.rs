// tests/sync_scenarios.rs

mod common;

use std::path::Path;

use common::{CoreHarness, ConfigFileBuilder, ROOT, init_tracing, sample_workspace};
use taskexplorer::engine::ExplorerEvent;
use taskexplorer::fs::mock::MockFileSystem;
use taskexplorer::task::FileKey;
use taskexplorer::tree::{SyncPhase, TreeItem};
use taskexplorer::types::{FsEventKind, TaskFormat};
use taskexplorer::watch::RawFsEvent;

fn started(fs: MockFileSystem, builder: ConfigFileBuilder) -> CoreHarness {
    init_tracing();
    let mut h = CoreHarness::new(builder.build(), fs, &[ROOT]);
    h.start();
    h
}

fn make_npm() -> ConfigFileBuilder {
    ConfigFileBuilder::new().with_formats(&[TaskFormat::Make, TaskFormat::Npm])
}

#[test]
fn initial_scan_materialises_every_enabled_format() {
    let h = started(sample_workspace(), make_npm());

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "start"]);
    assert_eq!(h.core.map().visible_total(), 5);
    assert!(h.core.is_idle());

    let project = h.core.tree().project(Path::new(ROOT)).unwrap();
    assert_eq!(project.name, "ws");
    assert_eq!(project.files().count(), 2);
    assert_eq!(
        h.core.tree().phase(Path::new(ROOT), TaskFormat::Make),
        SyncPhase::Idle
    );
}

#[test]
fn creating_editing_and_deleting_a_file_moves_counts_exactly() {
    let mut h = started(sample_workspace(), make_npm());
    let base = h.core.map().visible_count(TaskFormat::Make);

    h.write("/ws/sub/Makefile", "one:\n\techo 1\ntwo:\n\techo 2\n");
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Make), base + 2);

    let one = h.id(TaskFormat::Make, ROOT, "sub/Makefile", "one");
    let two = h.id(TaskFormat::Make, ROOT, "sub/Makefile", "two");
    let deltas_before = h.deltas.len();

    h.write(
        "/ws/sub/Makefile",
        "one:\n\techo 1\ntwo:\n\techo 2\nthree:\n\techo 3\n",
    );
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Make), base + 3);

    // Only the new task shows up in the delta; its siblings keep their ids.
    let edit = &h.deltas[deltas_before];
    assert_eq!(edit.files.len(), 1);
    let three = h.id(TaskFormat::Make, ROOT, "sub/Makefile", "three");
    assert_eq!(edit.files[0].added, vec![three]);
    assert!(edit.files[0].removed.is_empty());
    assert!(edit.files[0].updated.is_empty());
    assert!(h.core.map().contains(&one));
    assert!(h.core.map().contains(&two));

    h.delete("/ws/sub/Makefile");
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Make), base);
    assert!(!h.core.map().contains(&one));
}

#[test]
fn removing_a_target_removes_only_that_task() {
    let mut h = started(sample_workspace(), make_npm());

    h.write("/ws/Makefile", "build:\n\tcc main.c\n\nclean:\n\trm -f a.out\n");
    h.settle();

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean"]);
    let last = h.deltas.last().unwrap();
    assert_eq!(
        last.files[0].removed,
        vec![h.id(TaskFormat::Make, ROOT, "Makefile", "test")]
    );
    // `clean` moved up in the file.
    assert_eq!(
        last.files[0].updated,
        vec![h.id(TaskFormat::Make, ROOT, "Makefile", "clean")]
    );
}

#[test]
fn unchanged_contents_publish_nothing() {
    let mut h = started(sample_workspace(), make_npm());
    let published = h.deltas.len();

    let text = "build:\n\tcc main.c\n\ntest: build\n\t./run-tests\n\nclean:\n\trm -f a.out\n";
    h.write("/ws/Makefile", text);
    h.settle();

    assert_eq!(h.deltas.len(), published);
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
}

#[test]
fn rapid_delete_then_recreate_keeps_the_tasks() {
    let mut h = started(sample_workspace(), make_npm());
    let text = "build:\n\tcc main.c\n\ntest: build\n\t./run-tests\n\nclean:\n\trm -f a.out\n";

    h.delete("/ws/Makefile");
    h.write("/ws/Makefile", text);
    h.settle();

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
}

#[test]
fn malformed_file_keeps_previous_tasks_and_new_malformed_file_has_none() {
    let mut h = started(sample_workspace(), make_npm());

    h.write("/ws/package.json", "{ \"scripts\": { \"start\": ");
    h.settle();
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "start"]);

    let key = FileKey::new(TaskFormat::Npm, Path::new(ROOT), "package.json");
    assert!(h.core.tree().record(&key).unwrap().last_error.is_some());

    h.write("/ws/web/package.json", "not json at all");
    h.settle();
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "start"]);

    // Fixing the file clears the error and applies the new list.
    h.write("/ws/package.json", r#"{ "scripts": { "start": "node ." } }"#);
    h.settle();
    assert_eq!(h.names(TaskFormat::Npm), vec!["start"]);
    assert!(h.core.tree().record(&key).unwrap().last_error.is_none());
}

#[test]
fn duplicate_names_keep_the_first_definition() {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/Makefile", "clean:\n\trm a\n\nclean:\n\trm b\n");
    let h = started(fs, make_npm());

    assert_eq!(h.names(TaskFormat::Make), vec!["clean"]);
    let id = h.id(TaskFormat::Make, ROOT, "Makefile", "clean");
    assert_eq!(h.core.map().get(&id).unwrap().definition.raw_offset, None);

    let key = FileKey::new(TaskFormat::Make, Path::new(ROOT), "Makefile");
    let file = h.core.tree().project(Path::new(ROOT)).unwrap().file(&key).unwrap();
    assert_eq!(file.children.len(), 1);
}

#[test]
fn directory_create_is_one_batched_pass() {
    let mut h = started(sample_workspace(), make_npm());
    h.hold_parses = true;

    h.fs.add_file("/ws/pkg/a/Makefile", "a:\n\ttrue\n");
    h.fs.add_file("/ws/pkg/b/Makefile", "b:\n\ttrue\n");
    h.fs.add_file("/ws/pkg/package.json", r#"{"scripts":{"c":"true"}}"#);
    h.send(ExplorerEvent::Fs(RawFsEvent::dir("/ws/pkg", FsEventKind::Create)));
    h.send(ExplorerEvent::Fs(RawFsEvent::file(
        "/ws/pkg/a/Makefile",
        FsEventKind::Create,
    )));
    h.settle();

    assert_eq!(h.held.len(), 1);
    assert_eq!(h.held[0].jobs.len(), 3);

    h.release();
    assert_eq!(h.names(TaskFormat::Make), vec!["a", "b", "build", "clean", "test"]);
    assert_eq!(h.names(TaskFormat::Npm), vec!["c", "lint", "start"]);
}

#[test]
fn directory_delete_removes_every_file_below_it() {
    let fs = sample_workspace();
    fs.add_file("/ws/pkg/Makefile", "pkg:\n\ttrue\n");
    fs.add_file("/ws/pkg/inner/package.json", r#"{"scripts":{"x":"true"}}"#);
    let mut h = started(fs, make_npm());
    assert_eq!(h.core.map().visible_total(), 7);

    h.fs.remove("/ws/pkg");
    h.send(ExplorerEvent::Fs(RawFsEvent::dir("/ws/pkg", FsEventKind::Remove)));
    h.settle();

    assert_eq!(h.core.map().visible_total(), 5);
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
}

#[test]
fn superseded_pass_is_discarded() {
    let mut h = started(sample_workspace(), make_npm());
    h.hold_parses = true;

    h.write("/ws/Makefile", "first:\n\ttrue\n");
    h.settle();
    assert_eq!(h.held.len(), 1);

    h.write("/ws/Makefile", "second:\n\ttrue\n");
    assert_eq!(h.cancelled, vec![Path::new("/ws/Makefile").to_path_buf()]);

    h.settle();
    assert_eq!(h.held.len(), 2);

    // The stale batch is delivered first and must be ignored.
    h.release();
    assert_eq!(h.names(TaskFormat::Make), vec!["second"]);
    assert!(h.core.is_idle());
    assert_eq!(
        h.core.tree().phase(Path::new(ROOT), TaskFormat::Make),
        SyncPhase::Idle
    );
}

/// A directory pass whose batch was read before `edit` ran.
fn held_directory_pass(edit: impl FnOnce(&mut CoreHarness)) -> CoreHarness {
    let mut h = started(sample_workspace(), make_npm());
    h.hold_parses = true;

    h.fs.add_file("/ws/pkg/Makefile", "old:\n\ttrue\n");
    h.fs.add_file("/ws/pkg/package.json", r#"{"scripts":{"pkg":"true"}}"#);
    h.send(ExplorerEvent::Fs(RawFsEvent::dir("/ws/pkg", FsEventKind::Create)));
    h.settle();
    assert_eq!(h.held.len(), 1);
    assert_eq!(h.held[0].jobs.len(), 2);

    let batches = h.take_held_batches();
    h.hold_parses = false;
    edit(&mut h);
    h.settle();

    for batch in batches {
        h.send(ExplorerEvent::Parsed(batch));
    }
    h
}

#[test]
fn directory_pass_does_not_overwrite_a_newer_file_edit() {
    let h = held_directory_pass(|h| h.write("/ws/pkg/Makefile", "new:\n\ttrue\n"));

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "new", "test"]);
    // Untouched files of the same pass are still applied.
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "pkg", "start"]);
    assert!(h.core.is_idle());
    assert_eq!(
        h.core.tree().phase(Path::new(ROOT), TaskFormat::Make),
        SyncPhase::Idle
    );
}

#[test]
fn directory_pass_does_not_resurrect_a_deleted_file() {
    let h = held_directory_pass(|h| h.delete("/ws/pkg/Makefile"));

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "pkg", "start"]);
    let key = FileKey::new(TaskFormat::Make, Path::new(ROOT), "pkg/Makefile");
    assert!(h.core.tree().record(&key).is_none());
    assert!(h.core.is_idle());
}

#[test]
fn bash_scenario_enable_create_delete_disable_reenable() {
    let fs = sample_workspace();
    fs.add_file("/ws/tools/build.sh", "#!/bin/sh\nmake\n");
    let mut h = started(fs, make_npm());
    assert_eq!(h.core.map().visible_count(TaskFormat::Bash), 0);

    let with_bash = || {
        ConfigFileBuilder::new()
            .with_formats(&[TaskFormat::Make, TaskFormat::Npm, TaskFormat::Bash])
            .raw()
    };

    h.send(ExplorerEvent::ConfigUpdated(with_bash()));
    h.settle();
    let base = h.core.map().visible_count(TaskFormat::Bash);
    assert_eq!(base, 1);

    h.write("/ws/test_provider.sh", "echo \"hello\"\n");
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Bash), base + 1);

    h.delete("/ws/test_provider.sh");
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Bash), base);

    h.send(ExplorerEvent::ConfigUpdated(make_npm().raw()));
    assert_eq!(h.core.map().visible_count(TaskFormat::Bash), 0);
    assert!(h.core.is_idle(), "disabling must not rescan");

    h.send(ExplorerEvent::ConfigUpdated(with_bash()));
    assert_eq!(h.core.map().visible_count(TaskFormat::Bash), base);
    assert!(h.core.is_idle(), "re-enabling a loaded format must not rescan");

    let last = h.deltas.last().unwrap();
    assert_eq!(last.visibility_changed, vec![TaskFormat::Bash]);
}

#[test]
fn script_labels_drop_the_extension() {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/run.sh", "echo\n");
    let h = started(fs, ConfigFileBuilder::new().with_formats(&[TaskFormat::Bash]));

    let key = FileKey::new(TaskFormat::Bash, Path::new(ROOT), "run.sh");
    let file = h.core.tree().project(Path::new(ROOT)).unwrap().file(&key).unwrap();
    assert_eq!(file.children[0].label(), "run");
    assert_eq!(h.names(TaskFormat::Bash), vec!["run.sh"]);
}

#[test]
fn multiple_project_folders_are_independent() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/a/Makefile", "all:\n\ttrue\n");
    fs.add_file("/b/Makefile", "all:\n\ttrue\n");
    let mut h = CoreHarness::new(make_npm().build(), fs, &["/a", "/b"]);
    h.start();

    assert_eq!(h.core.map().visible_count(TaskFormat::Make), 2);
    assert_ne!(
        h.id(TaskFormat::Make, "/a", "Makefile", "all"),
        h.id(TaskFormat::Make, "/b", "Makefile", "all")
    );

    h.delete("/b/Makefile");
    h.settle();
    assert!(h.core.map().contains(&h.id(TaskFormat::Make, "/a", "Makefile", "all")));
    assert_eq!(h.core.map().visible_count(TaskFormat::Make), 1);
}

#[test]
fn grouped_tree_has_nested_groups() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/ws/Makefile",
        "build-ui-one:\n\ttrue\nbuild-ui-two:\n\ttrue\nbuild-api:\n\ttrue\ntest:\n\ttrue\n",
    );
    let h = started(
        fs,
        make_npm().with_separator("-").with_max_level(2),
    );

    let key = FileKey::new(TaskFormat::Make, Path::new(ROOT), "Makefile");
    let file = h.core.tree().project(Path::new(ROOT)).unwrap().file(&key).unwrap();
    let labels: Vec<&str> = file.children.iter().map(TreeItem::label).collect();
    assert_eq!(labels, vec!["build", "test"]);

    let TreeItem::Group(build) = &file.children[0] else {
        panic!("expected a group");
    };
    let inner: Vec<&str> = build.children.iter().map(TreeItem::label).collect();
    assert_eq!(inner, vec!["ui", "api"]);
    let TreeItem::Group(ui) = &build.children[0] else {
        panic!("expected a nested group");
    };
    let leaves: Vec<&str> = ui.children.iter().map(TreeItem::label).collect();
    assert_eq!(leaves, vec!["one", "two"]);
}

#[test]
fn grouping_round_trip_restores_the_original_tree() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/ws/Makefile",
        "build-ui:\n\ttrue\ntest:\n\ttrue\nbuild-api:\n\ttrue\nlint-js:\n\ttrue\n",
    );
    let mut h = started(fs, make_npm());
    let key = FileKey::new(TaskFormat::Make, Path::new(ROOT), "Makefile");
    let original = h
        .core
        .tree()
        .project(Path::new(ROOT))
        .unwrap()
        .file(&key)
        .unwrap()
        .clone();

    h.send(ExplorerEvent::ConfigUpdated(make_npm().with_separator("-").raw()));
    let grouped = h.core.tree().project(Path::new(ROOT)).unwrap().file(&key).unwrap();
    let labels: Vec<&str> = grouped.children.iter().map(TreeItem::label).collect();
    // `lint` has a single member, so it stays a plain task.
    assert_eq!(labels, vec!["build", "test", "lint-js"]);
    assert!(h.deltas.last().unwrap().regrouped);

    h.send(ExplorerEvent::ConfigUpdated(make_npm().raw()));
    let restored = h.core.tree().project(Path::new(ROOT)).unwrap().file(&key).unwrap();
    assert_eq!(*restored, original);
}

#[test]
fn file_children_only_hold_visible_tasks() {
    let fs = MockFileSystem::new();
    fs.add_file(
        "/ws/Makefile",
        "build-ui:\n\ttrue\nbuild-api:\n\ttrue\ntest:\n\ttrue\n",
    );
    let grouped = || make_npm().with_separator("-");
    let mut h = started(fs, grouped());
    let key = FileKey::new(TaskFormat::Make, Path::new(ROOT), "Makefile");
    let labels = |h: &CoreHarness| -> Vec<String> {
        h.core
            .tree()
            .project(Path::new(ROOT))
            .and_then(|p| p.file(&key))
            .map(|f| f.children.iter().map(|c| c.label().to_string()).collect())
            .unwrap_or_default()
    };
    assert_eq!(labels(&h), vec!["build", "test"]);

    // One hidden member leaves a single task, which is not a group.
    h.send(ExplorerEvent::ConfigUpdated(grouped().with_exclude_task("^build-api$").raw()));
    assert_eq!(labels(&h), vec!["build-ui", "test"]);
    let api = h.id(TaskFormat::Make, ROOT, "Makefile", "build-api");
    assert!(h.core.map().contains(&api));

    h.send(ExplorerEvent::ConfigUpdated(grouped().raw()));
    assert_eq!(labels(&h), vec!["build", "test"]);

    // A file with nothing visible drops out of the tree until re-enabled.
    let npm_only = || {
        ConfigFileBuilder::new()
            .with_formats(&[TaskFormat::Npm])
            .with_separator("-")
    };
    h.send(ExplorerEvent::ConfigUpdated(npm_only().raw()));
    assert!(labels(&h).is_empty());
    assert!(h.core.tree().record(&key).is_some());

    h.send(ExplorerEvent::ConfigUpdated(grouped().raw()));
    assert_eq!(labels(&h), vec!["build", "test"]);
}

#[test]
fn excluding_a_task_twice_is_a_no_op() {
    let mut h = started(sample_workspace(), make_npm());
    let test = h.id(TaskFormat::Make, ROOT, "Makefile", "test");

    h.send(ExplorerEvent::ExcludeTask(test.clone()));
    assert!(!h.core.map().contains(&test));
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean"]);
    let published = h.deltas.len();

    h.send(ExplorerEvent::ExcludeTask(test.clone()));
    assert_eq!(h.deltas.len(), published);
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean"]);
}

#[test]
fn excluded_task_is_not_rematerialised_by_an_edit() {
    let mut h = started(sample_workspace(), make_npm());
    let test = h.id(TaskFormat::Make, ROOT, "Makefile", "test");
    h.send(ExplorerEvent::ExcludeTask(test.clone()));

    h.write(
        "/ws/Makefile",
        "build:\n\tcc main.c\n\ntest: build\n\t./run-tests\n\nclean:\n\trm -f a.out\n\ndist:\n\ttar cf d.tar .\n",
    );
    h.settle();

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "dist"]);
    assert!(!h.core.map().contains(&test));
}

#[test]
fn excluding_a_file_twice_is_a_no_op_and_survives_edits() {
    let mut h = started(sample_workspace(), make_npm());
    let exclude = || ExplorerEvent::ExcludeFile {
        project: ROOT.into(),
        rel_path: "package.json".to_string(),
    };

    h.send(exclude());
    assert_eq!(h.core.map().visible_count(TaskFormat::Npm), 0);
    assert!(!h.core.map().has_format(TaskFormat::Npm));
    let published = h.deltas.len();

    h.send(exclude());
    assert_eq!(h.deltas.len(), published);

    h.write("/ws/package.json", r#"{ "scripts": { "start": "node .", "new": "true" } }"#);
    h.settle();
    assert_eq!(h.core.map().visible_count(TaskFormat::Npm), 0);
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
}

#[test]
fn configured_task_pattern_hides_without_removing() {
    let h = started(sample_workspace(), make_npm().with_exclude_task("^cle"));
    let clean = h.id(TaskFormat::Make, ROOT, "Makefile", "clean");

    assert_eq!(h.names(TaskFormat::Make), vec!["build", "test"]);
    let node = h.core.map().get(&clean).unwrap();
    assert!(node.hidden.excluded);
    assert!(!node.is_visible());
}

#[test]
fn changing_exclusion_patterns_reevaluates_nodes() {
    let mut h = started(sample_workspace(), make_npm());
    let lint = h.id(TaskFormat::Npm, ROOT, "package.json", "lint");

    h.send(ExplorerEvent::ConfigUpdated(make_npm().with_exclude_task("^lint$").raw()));
    assert_eq!(h.names(TaskFormat::Npm), vec!["start"]);
    assert_eq!(h.deltas.last().unwrap().exclusion_changed, vec![lint.clone()]);
    h.settle();

    h.send(ExplorerEvent::ConfigUpdated(make_npm().raw()));
    h.settle();
    assert_eq!(h.names(TaskFormat::Npm), vec!["lint", "start"]);
    assert!(h.core.map().contains(&lint));
}

#[test]
fn task_pattern_change_reparses_nothing() {
    let mut h = started(sample_workspace(), make_npm());
    h.hold_parses = true;

    h.send(ExplorerEvent::ConfigUpdated(make_npm().with_exclude_task("^lint$").raw()));
    assert!(h.core.next_deadline().is_none());
    h.settle();

    assert!(h.held.is_empty());
    assert_eq!(h.names(TaskFormat::Npm), vec!["start"]);
    assert!(h.core.is_idle());
}

#[test]
fn added_glob_hides_and_lifted_glob_rescans() {
    let fs = sample_workspace();
    fs.add_file("/ws/vendor/Makefile", "vendored:\n\ttrue\n");
    let mut h = started(fs, make_npm().with_exclude("**/vendor/**"));
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);

    // Discovery skipped the directory; only a rescan can find it.
    h.send(ExplorerEvent::ConfigUpdated(make_npm().raw()));
    assert!(h.core.next_deadline().is_some());
    h.settle();
    assert_eq!(
        h.names(TaskFormat::Make),
        vec!["build", "clean", "test", "vendored"]
    );

    h.hold_parses = true;
    h.send(ExplorerEvent::ConfigUpdated(make_npm().with_exclude("**/vendor/**").raw()));
    assert!(h.core.next_deadline().is_none());
    h.settle();
    assert!(h.held.is_empty());
    assert_eq!(h.names(TaskFormat::Make), vec!["build", "clean", "test"]);
    let vendored = h.id(TaskFormat::Make, ROOT, "vendor/Makefile", "vendored");
    assert!(h.core.map().contains(&vendored));
}

#[test]
fn failed_discovery_keeps_the_current_tasks() {
    let mut h = started(sample_workspace(), make_npm());
    h.send(ExplorerEvent::Fs(RawFsEvent::dir(ROOT, FsEventKind::Modify)));
    let due = h.core.next_deadline().unwrap();
    h.now = due;

    // Drive the tick by hand so the discover result can be replaced.
    let step = h.core.step(ExplorerEvent::Tick, h.now);
    let request = step
        .commands
        .into_iter()
        .find_map(|c| match c {
            taskexplorer::engine::CoreCommand::Discover(r) => Some(r),
            _ => None,
        })
        .expect("discover command");

    h.send(ExplorerEvent::DiscoveryFailed {
        scope: request.scope,
        generation: request.generation,
        message: "permission denied".to_string(),
    });

    assert_eq!(h.core.map().visible_total(), 5);
    assert!(h.core.is_idle());
}
