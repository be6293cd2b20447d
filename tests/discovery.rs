// tests/discovery.rs

mod common;

use std::path::{Path, PathBuf};

use notify::Event;
use notify::event::{CreateKind, DataChange, EventKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};

use common::ConfigFileBuilder;
use taskexplorer::filter::ExclusionFilter;
use taskexplorer::fs::mock::MockFileSystem;
use taskexplorer::parse::ParserRegistry;
use taskexplorer::types::{FsEventKind, TaskFormat};
use taskexplorer::watch::{DiscoveredFile, RawFsEvent, discover, to_raw_events};

fn workspace() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/ws/Makefile", "all:\n");
    fs.add_file("/ws/package.json", "{}");
    fs.add_file("/ws/web/package.json", "{}");
    fs.add_file("/ws/web/node_modules/left-pad/package.json", "{}");
    fs.add_file("/ws/scripts/deploy.sh", "echo\n");
    fs.add_file("/ws/README.md", "# docs\n");
    fs
}

fn run(
    fs: &MockFileSystem,
    filter: &ExclusionFilter,
    scope: &str,
    formats: &[TaskFormat],
) -> Vec<String> {
    let registry = ParserRegistry::new().unwrap();
    discover(fs, &registry, filter, Path::new("/ws"), Path::new(scope), formats)
        .unwrap()
        .into_iter()
        .map(|f: DiscoveredFile| format!("{}:{}", f.format, f.rel_path))
        .collect()
}

fn default_filter() -> ExclusionFilter {
    ExclusionFilter::from_config(&ConfigFileBuilder::new().with_exclude("**/node_modules/**").build())
        .unwrap()
}

#[test]
fn finds_enabled_formats_and_skips_excluded_directories() {
    let found = run(
        &workspace(),
        &default_filter(),
        "/ws",
        &[TaskFormat::Make, TaskFormat::Npm],
    );
    assert_eq!(
        found,
        vec!["make:Makefile", "npm:package.json", "npm:web/package.json"]
    );
}

#[test]
fn scope_limits_the_walk() {
    let found = run(&workspace(), &default_filter(), "/ws/web", &TaskFormat::ALL);
    assert_eq!(found, vec!["npm:web/package.json"]);

    let single = run(&workspace(), &default_filter(), "/ws/scripts/deploy.sh", &TaskFormat::ALL);
    assert_eq!(single, vec!["bash:scripts/deploy.sh"]);
}

#[test]
fn vanished_scope_has_no_files() {
    let found = run(&workspace(), &default_filter(), "/ws/gone", &TaskFormat::ALL);
    assert!(found.is_empty());
}

#[test]
fn live_file_exclusion_is_honoured() {
    let mut filter = default_filter();
    assert!(filter.exclude_file(Path::new("/ws"), "web/package.json"));
    assert!(!filter.exclude_file(Path::new("/ws"), "./web/package.json"));

    let found = run(&workspace(), &filter, "/ws", &[TaskFormat::Npm]);
    assert_eq!(found, vec!["npm:package.json"]);
}

fn event(kind: EventKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
}

#[test]
fn notify_events_are_normalised() {
    let create = to_raw_events(&event(EventKind::Create(CreateKind::File), &["/nowhere/a.sh"]));
    assert_eq!(create, vec![RawFsEvent::file("/nowhere/a.sh", FsEventKind::Create)]);

    let dir_gone = to_raw_events(&event(EventKind::Remove(RemoveKind::Folder), &["/nowhere/d"]));
    assert_eq!(dir_gone, vec![RawFsEvent::dir("/nowhere/d", FsEventKind::Remove)]);

    let write = to_raw_events(&event(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        &["/nowhere/Makefile"],
    ));
    assert_eq!(write, vec![RawFsEvent::file("/nowhere/Makefile", FsEventKind::Modify)]);

    let touched = to_raw_events(&event(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
        &["/nowhere/Makefile"],
    ));
    assert!(touched.is_empty());
}

#[test]
fn renames_become_remove_then_create() {
    let raw = to_raw_events(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &["/nowhere/old.sh", "/nowhere/new.sh"],
    ));
    assert_eq!(
        raw,
        vec![
            RawFsEvent::file("/nowhere/old.sh", FsEventKind::Remove),
            RawFsEvent::file("/nowhere/new.sh", FsEventKind::Create),
        ]
    );
}
